//! Multipart form parsing for item uploads

use axum::{body::Bytes, extract::Multipart};
use std::collections::HashMap;

use crate::handlers::ApiError;

/// Form field carrying the photo file
pub const PHOTO_FIELD: &str = "photo";

/// A file received under the `photo` field
#[derive(Debug)]
pub struct PhotoUpload {
    /// Client-side filename, used only for its extension
    pub filename: Option<String>,
    pub bytes: Bytes,
}

/// Fully buffered multipart form: text fields plus at most one photo
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    pub photo: Option<PhotoUpload>,
}

impl UploadForm {
    /// Drain a multipart body.
    ///
    /// An empty file part with no filename (an untouched browser file input)
    /// counts as no photo.
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if name == PHOTO_FIELD {
                let filename = field.file_name().map(str::to_owned);
                let bytes = field.bytes().await?;

                if filename.as_deref().unwrap_or_default().is_empty() && bytes.is_empty() {
                    continue;
                }
                if form.photo.is_some() {
                    return Err(ApiError::bad_request("Only one photo file may be uploaded"));
                }

                form.photo = Some(PhotoUpload { filename, bytes });
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Remove and return a text field
    pub fn take_text(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        extract::FromRequest,
        http::{header, Request, StatusCode},
    };

    const BOUNDARY: &str = "upload-test-boundary";

    async fn multipart(body: &str) -> Multipart {
        let request = Request::builder()
            .method("POST")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body.replace('\n', "\r\n")))
            .unwrap();

        Multipart::from_request(request, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_reads_text_and_photo() {
        let body = format!(
            "--{b}\nContent-Disposition: form-data; name=\"inventory_name\"\n\nDrill\n\
             --{b}\nContent-Disposition: form-data; name=\"photo\"; filename=\"drill.jpg\"\n\
             Content-Type: image/jpeg\n\njpegdata\n--{b}--\n",
            b = BOUNDARY
        );

        let mut form = UploadForm::read(multipart(&body).await).await.unwrap();

        assert_eq!(form.take_text("inventory_name").as_deref(), Some("Drill"));
        assert!(form.take_text("description").is_none());
        let photo = form.photo.unwrap();
        assert_eq!(photo.filename.as_deref(), Some("drill.jpg"));
        assert_eq!(&photo.bytes[..], b"jpegdata");
    }

    #[tokio::test]
    async fn test_empty_file_input_is_no_photo() {
        let body = format!(
            "--{b}\nContent-Disposition: form-data; name=\"photo\"; filename=\"\"\n\
             Content-Type: application/octet-stream\n\n\n--{b}--\n",
            b = BOUNDARY
        );

        let form = UploadForm::read(multipart(&body).await).await.unwrap();

        assert!(form.photo.is_none());
    }

    #[tokio::test]
    async fn test_rejects_second_photo() {
        let part = format!(
            "--{b}\nContent-Disposition: form-data; name=\"photo\"; filename=\"a.png\"\n\nxx\n",
            b = BOUNDARY
        );
        let body = format!("{part}{part}--{b}--\n", part = part, b = BOUNDARY);

        let err = UploadForm::read(multipart(&body).await).await.unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
