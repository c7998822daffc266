use crate::{
    AppState,
    api::models::uploads::UploadResponse,
    digest::ContentDigest,
    errors::{Error, Result},
    sniff::{self, ImageFormat, SNIFF_LEN},
    storage::StoragePath,
};
use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{Field, MultipartError, MultipartRejection},
    },
    http::{HeaderMap, StatusCode, header},
};
use tracing::{Span, debug, instrument};

/// Largest accepted upload, in bytes. Applies to the whole request body.
pub const MAX_UPLOAD_SIZE: usize = 5 * 1024 * 1024;

/// The fields of an upload form, once read and classified.
#[derive(Debug)]
pub struct UploadRequest {
    pub filename: String,
    pub format: ImageFormat,
    pub content: Vec<u8>,
    pub pubkey: String,
    pub signature: String,
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "uploads",
    summary = "Upload image",
    description = "Upload a JPEG or PNG image. The form carries the file, the uploader's hex x-only public key \
                   and a hex Schnorr signature over the SHA-256 digest of the file bytes. \
                   Identical content always resolves to the same URL.",
    request_body(
        content_type = "multipart/form-data",
        description = "Fields `file` (with a filename), `pubkey` and `signature`"
    ),
    responses(
        (status = 200, description = "File stored", body = UploadResponse),
        (status = 400, description = "Malformed form, oversized body, unsupported format or badly encoded credentials"),
        (status = 401, description = "Signature did not verify or key is not allowed to upload"),
        (status = 500, description = "Internal server error")
    )
)]
#[instrument(skip_all, fields(filename, digest))]
pub async fn upload_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    // Reject declared oversize bodies before reading any of them
    check_content_length(&headers)?;

    let multipart = multipart.map_err(|e| Error::BadRequest { message: e.body_text() })?;
    let upload = read_upload(multipart).await?;
    Span::current().record("filename", upload.filename.as_str());

    let digest = ContentDigest::compute(&upload.content);
    Span::current().record("digest", tracing::field::display(&digest));
    debug!(pubkey = %upload.pubkey, signature = %upload.signature, "Read upload credentials");

    state.authorizer.authorize(&upload.pubkey, &upload.signature, &digest)?;

    let path = StoragePath::new(&digest, &upload.filename);
    let stored = state.storage.store(&path, &upload.content).await?;

    tracing::info!(
        format = upload.format.mime_type(),
        size_bytes = stored.size_bytes,
        path = %stored.path.url_path(),
        "Stored upload"
    );

    Ok(Json(UploadResponse::new(upload.filename, &state.domain, &stored.path)))
}

fn check_content_length(headers: &HeaderMap) -> Result<()> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());

    if let Some(length) = declared
        && length > MAX_UPLOAD_SIZE as u64
    {
        tracing::warn!(content_length = length, max_size = MAX_UPLOAD_SIZE, "Upload exceeds size limit");
        return Err(Error::PayloadTooLarge {
            max_size: MAX_UPLOAD_SIZE,
        });
    }

    Ok(())
}

/// Read every form field, keeping `file`, `pubkey` and `signature`.
///
/// Unknown fields are skipped. The file is classified as soon as enough of it has arrived, so
/// a non-image body is rejected without buffering the rest of it. Missing credentials come back
/// as empty strings and fail decoding later.
pub async fn read_upload(mut multipart: Multipart) -> Result<UploadRequest> {
    let mut file: Option<(String, ImageFormat, Vec<u8>)> = None;
    let mut pubkey: Option<String> = None;
    let mut signature: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                if file.is_some() {
                    return Err(Error::BadRequest {
                        message: "Only one 'file' field is allowed".to_string(),
                    });
                }

                // A part without a filename is a plain value, not a file
                let Some(filename) = field.file_name().filter(|name| !name.is_empty()).map(str::to_string) else {
                    return Err(Error::BadRequest {
                        message: "Field 'file' must be a file upload with a filename".to_string(),
                    });
                };

                let (format, content) = read_file(field).await?;
                file = Some((filename, format, content));
            }
            "pubkey" => pubkey = Some(field.text().await.map_err(multipart_error)?),
            "signature" => signature = Some(field.text().await.map_err(multipart_error)?),
            other => {
                debug!(field = %other, "Ignoring unknown form field");
            }
        }
    }

    let Some((filename, format, content)) = file else {
        return Err(Error::BadRequest {
            message: "Missing required field: 'file'".to_string(),
        });
    };

    Ok(UploadRequest {
        filename,
        format,
        content,
        pubkey: pubkey.unwrap_or_default(),
        signature: signature.unwrap_or_default(),
    })
}

async fn read_file(mut field: Field<'_>) -> Result<(ImageFormat, Vec<u8>)> {
    let mut content = Vec::new();
    let mut format = None;

    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if content.len() + chunk.len() > MAX_UPLOAD_SIZE {
            tracing::warn!(
                received = content.len() + chunk.len(),
                max_size = MAX_UPLOAD_SIZE,
                "File size limit exceeded, aborting upload"
            );
            return Err(Error::PayloadTooLarge {
                max_size: MAX_UPLOAD_SIZE,
            });
        }
        content.extend_from_slice(&chunk);

        if format.is_none() && content.len() >= SNIFF_LEN {
            format = Some(sniff::classify(&content)?);
        }
    }

    // Files shorter than the sniff window are classified once complete
    let format = match format {
        Some(format) => format,
        None => sniff::classify(&content)?,
    };

    Ok((format, content))
}

fn multipart_error(e: MultipartError) -> Error {
    match e.status() {
        StatusCode::PAYLOAD_TOO_LARGE => Error::PayloadTooLarge {
            max_size: MAX_UPLOAD_SIZE,
        },
        status if status.is_client_error() => Error::BadRequest {
            message: format!("Failed to parse multipart data: {}", e.body_text()),
        },
        _ => Error::Internal {
            operation: format!("read upload body: {}", e.body_text()),
        },
    }
}
