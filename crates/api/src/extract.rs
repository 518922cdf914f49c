//! Request extractors that reject with the API's JSON error body.
//!
//! axum's built-in `Json`, `Path` and `Multipart` extractors reject with
//! plain-text bodies and, for bad JSON, a 422. Handlers use these wrappers
//! instead so every malformed request is a 400 `{"message": ...}`.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Multipart, Path, Request, multipart::Field},
    http::{header::CONTENT_TYPE, request::Parts},
};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

use lumina_core::Price;

use crate::error::AppError;
use crate::models::ProductFields;
use crate::services::{UploadStore, UploadedFile};

/// JSON body extractor; rejections become 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
        }
    }
}

/// Path parameter extractor for typed ids; a non-numeric id is a 400.
#[derive(Debug, Clone, Copy)]
pub struct IdPath<T>(pub T);

impl<T, S> FromRequestParts<S> for IdPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::BadRequest(format!(
                "invalid id: {}",
                rejection.body_text()
            ))),
        }
    }
}

// =============================================================================
// Product payloads
// =============================================================================

/// Product create/update body, sent either as JSON or as a multipart form.
///
/// Multipart forms carry the text fields plus an optional `cover_image` file
/// and repeated `gallery` files. Empty file parts (a file input left blank)
/// are ignored.
#[derive(Debug, Default)]
pub struct ProductPayload {
    pub fields: ProductFields,
    pub cover: Option<UploadedFile>,
    pub gallery: Vec<UploadedFile>,
}

impl ProductPayload {
    /// Store any uploaded files and fold their names into the fields.
    ///
    /// An uploaded cover replaces `cover_image`; uploaded gallery files
    /// replace the gallery list. The stored file names are returned
    /// alongside so the caller can discard them if the write that follows
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Upload` if a file cannot be stored. Nothing stored
    /// by this call is left on disk in that case.
    pub async fn into_fields(
        self,
        store: &UploadStore,
    ) -> Result<(ProductFields, Vec<String>), AppError> {
        let mut fields = self.fields;
        let mut stored = Vec::new();

        if let Some(cover) = &self.cover {
            let name = store.save(cover).await?;
            fields.cover_image = Some(name.clone());
            stored.push(name);
        }
        if !self.gallery.is_empty() {
            match store.save_all(&self.gallery).await {
                Ok(names) => {
                    stored.extend_from_slice(&names);
                    fields.gallery = Some(names);
                }
                Err(e) => {
                    store.remove_all(&stored).await;
                    return Err(e.into());
                }
            }
        }

        Ok((fields, stored))
    }
}

impl<S> FromRequest<S> for ProductPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(&req) {
            let ApiJson(fields) = ApiJson::<ProductFields>::from_request(req, state).await?;
            return Ok(Self {
                fields,
                ..Self::default()
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        let mut payload = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
            let name = field.name().unwrap_or_default().to_owned();

            if field.file_name().is_some() {
                let Some(file) = read_file(field).await? else {
                    continue;
                };
                match name.as_str() {
                    "cover_image" | "portada" | "image" => payload.cover = Some(file),
                    "gallery" | "galeria" => payload.gallery.push(file),
                    other => tracing::debug!(field = other, "Ignoring unexpected file field"),
                }
            } else {
                let text = field.text().await.map_err(bad_multipart)?;
                apply_text_field(&mut payload.fields, &name, text)?;
            }
        }

        Ok(payload)
    }
}

/// Every file part of a multipart upload, in order, whatever its field name.
#[derive(Debug, Default)]
pub struct ImageFiles(pub Vec<UploadedFile>);

impl<S> FromRequest<S> for ImageFiles
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        let mut files = Vec::new();
        while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
            if field.file_name().is_none() {
                continue;
            }
            if let Some(file) = read_file(field).await? {
                files.push(file);
            }
        }

        Ok(Self(files))
    }
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"))
}

async fn read_file(field: Field<'_>) -> Result<Option<UploadedFile>, AppError> {
    let file_name = field.file_name().map(str::to_owned);
    let bytes = field.bytes().await.map_err(bad_multipart)?;
    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(UploadedFile { file_name, bytes }))
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(err.body_text())
}

/// Apply one multipart text field, accepting the same aliases as JSON.
/// Blank numeric fields count as absent.
fn apply_text_field(fields: &mut ProductFields, name: &str, text: String) -> Result<(), AppError> {
    match name {
        "name" | "nombre" => fields.name = Some(text),
        "description" | "descripcion" => fields.description = Some(text),
        "category" | "categoria" => fields.category = Some(text),
        "cover_image" | "portada" | "image" => fields.cover_image = Some(text),
        "price" | "precio" => {
            let raw = text.trim();
            if !raw.is_empty() {
                let amount: Decimal = raw
                    .parse()
                    .map_err(|_| AppError::BadRequest("price must be a number".to_string()))?;
                let price =
                    Price::new(amount).map_err(|e| AppError::BadRequest(e.to_string()))?;
                fields.price = Some(price);
            }
        }
        "quantity" | "stock" => {
            let raw = text.trim();
            if !raw.is_empty() {
                let quantity = raw.parse().map_err(|_| {
                    AppError::BadRequest("quantity must be a whole number".to_string())
                })?;
                fields.quantity = Some(quantity);
            }
        }
        "gallery" | "galeria" if text.trim().is_empty() => {}
        "gallery" | "galeria" => {
            let entries = if text.trim_start().starts_with('[') {
                serde_json::from_str::<Vec<String>>(&text).map_err(|_| {
                    AppError::BadRequest("gallery must be a list of strings".to_string())
                })?
            } else {
                vec![text]
            };
            fields.gallery.get_or_insert_with(Vec::new).extend(entries);
        }
        other => tracing::debug!(field = other, "Ignoring unexpected form field"),
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;

    use super::*;

    #[test]
    fn test_text_fields_accept_aliases() {
        let mut fields = ProductFields::default();
        apply_text_field(&mut fields, "nombre", "Collar Luna".to_string()).unwrap();
        apply_text_field(&mut fields, "precio", " 85000.50 ".to_string()).unwrap();
        apply_text_field(&mut fields, "stock", "3".to_string()).unwrap();
        apply_text_field(&mut fields, "galeria", "a.jpg".to_string()).unwrap();
        apply_text_field(&mut fields, "gallery", r#"["b.jpg","c.jpg"]"#.to_string()).unwrap();

        assert_eq!(fields.name.as_deref(), Some("Collar Luna"));
        assert_eq!(fields.price.unwrap().to_string(), "$85000.50");
        assert_eq!(fields.quantity, Some(3));
        assert_eq!(
            fields.gallery.unwrap(),
            vec!["a.jpg".to_string(), "b.jpg".to_string(), "c.jpg".to_string()]
        );
    }

    #[test]
    fn test_blank_numbers_are_absent() {
        let mut fields = ProductFields::default();
        apply_text_field(&mut fields, "price", "  ".to_string()).unwrap();
        apply_text_field(&mut fields, "quantity", String::new()).unwrap();
        assert!(fields.price.is_none());
        assert!(fields.quantity.is_none());
    }

    #[test]
    fn test_bad_numbers_rejected() {
        let mut fields = ProductFields::default();
        assert!(apply_text_field(&mut fields, "price", "ten".to_string()).is_err());
        assert!(apply_text_field(&mut fields, "price", "-1".to_string()).is_err());
        assert!(apply_text_field(&mut fields, "stock", "1.5".to_string()).is_err());
    }

    #[tokio::test]
    async fn test_json_product_payload() {
        let req = Request::builder()
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"Anillo Sol","price":40}"#))
            .unwrap();

        let payload = ProductPayload::from_request(req, &()).await.unwrap();

        assert_eq!(payload.fields.name.as_deref(), Some("Anillo Sol"));
        assert!(payload.cover.is_none());
        assert!(payload.gallery.is_empty());
    }

    #[tokio::test]
    async fn test_multipart_product_payload() {
        let body = "--XyZ\r\n\
            Content-Disposition: form-data; name=\"nombre\"\r\n\r\n\
            Collar Luna\r\n\
            --XyZ\r\n\
            Content-Disposition: form-data; name=\"portada\"; filename=\"luna.png\"\r\n\
            Content-Type: image/png\r\n\r\n\
            PNGDATA\r\n\
            --XyZ\r\n\
            Content-Disposition: form-data; name=\"gallery\"; filename=\"\"\r\n\
            Content-Type: application/octet-stream\r\n\r\n\
            \r\n\
            --XyZ--\r\n";
        let req = Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, "multipart/form-data; boundary=XyZ")
            .body(Body::from(body))
            .unwrap();

        let payload = ProductPayload::from_request(req, &()).await.unwrap();

        assert_eq!(payload.fields.name.as_deref(), Some("Collar Luna"));
        let cover = payload.cover.unwrap();
        assert_eq!(cover.file_name.as_deref(), Some("luna.png"));
        assert_eq!(&cover.bytes[..], b"PNGDATA");
        assert!(payload.gallery.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let req = Request::builder()
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let err = ApiJson::<serde_json::Value>::from_request(req, &())
            .await
            .unwrap_err();

        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
