use axum::extract::Multipart;

use snipdoc_core::DocError;

/// An uploaded PDF with its data and metadata.
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Pull the `file` field out of a multipart upload and check it is a PDF.
pub async fn parse_pdf_upload(mut multipart: Multipart) -> Result<UploadedFile, DocError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DocError::validation(format!("Failed to read form field: {}", e)))?
    {
        if field.name() != Some("file") {
            // Ignore unknown fields
            let _ = field.bytes().await;
            continue;
        }

        let filename = field.file_name().unwrap_or("").to_string();
        if filename.is_empty() {
            return Err(DocError::validation("No file selected"));
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| DocError::validation(format!("Failed to read file data: {}", e)))?
            .to_vec();

        if !data.starts_with(b"%PDF-") {
            return Err(DocError::validation(format!(
                "{} doesn't appear to be a valid PDF",
                filename
            )));
        }
        return Ok(UploadedFile { filename, data });
    }

    Err(DocError::validation("No file uploaded"))
}
