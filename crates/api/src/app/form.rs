//! Multipart form parsing for the location, component and event endpoints.
//!
//! Field names match case-insensitively against a fixed set per endpoint.
//! Text values are parsed on access so each failure names its field.

use std::collections::HashMap;

use axum::extract::Multipart;
use axum::extract::multipart::{Field, MultipartError};
use axum::http::StatusCode;
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use skillsgarden_core::validation::{check_image, image_too_large};
use skillsgarden_infra::ImageUpload;

use crate::app::errors::{ApiError, ErrorCode};

/// The accepted fields of one form: plain fields and image fields.
#[derive(Debug, Clone, Copy)]
pub struct FormSpec {
    pub fields: &'static [&'static str],
    pub images: &'static [&'static str],
}

impl FormSpec {
    fn field(&self, name: &str) -> Option<&'static str> {
        self.fields.iter().copied().find(|f| f.eq_ignore_ascii_case(name))
    }

    fn image(&self, name: &str) -> Option<&'static str> {
        self.images.iter().copied().find(|f| f.eq_ignore_ascii_case(name))
    }
}

pub const LOCATION_FORM: FormSpec = FormSpec {
    fields: &["Name", "City", "Lat", "Lng"],
    images: &["Image"],
};

pub const COMPONENT_FORM: FormSpec = FormSpec {
    fields: &["Name", "Description", "Exercises"],
    images: &["Image"],
};

pub const EVENT_FORM: FormSpec = FormSpec {
    fields: &["Title", "Description", "StartTime", "MaxRegistrations"],
    images: &["Image"],
};

/// A parsed multipart body keyed by canonical field name.
#[derive(Debug, Default)]
pub struct FormData {
    text: HashMap<&'static str, String>,
    images: HashMap<&'static str, ImageUpload>,
}

impl FormData {
    pub async fn read(mut multipart: Multipart, spec: FormSpec) -> Result<Self, ApiError> {
        let mut form = FormData::default();

        while let Some(field) = multipart.next_field().await.map_err(unreadable)? {
            let name = field.name().unwrap_or_default().to_string();

            if let Some(file_name) = field.file_name().map(str::to_string) {
                let Some(canonical) = spec.image(&name) else {
                    return Err(ApiError::validation(format!("{name} is not a valid image field")));
                };
                let bytes = read_image(field, &file_name).await?;
                form.images.insert(canonical, ImageUpload { file_name, bytes });
                continue;
            }

            let Some(canonical) = spec.field(&name) else {
                return Err(ApiError::validation(format!("{name} is not a valid field")));
            };
            let value = field.text().await.map_err(unreadable)?;
            form.text.insert(canonical, value);
        }

        Ok(form)
    }

    pub fn text(&self, field: &str) -> Option<String> {
        self.text.get(field).cloned()
    }

    pub fn int(&self, field: &str) -> Result<Option<i32>, ApiError> {
        self.parse(field, "an integer", |v| v.trim().parse::<i32>().ok())
    }

    /// Accepts `52.1` and the comma-decimal `52,1`.
    pub fn double(&self, field: &str) -> Result<Option<f64>, ApiError> {
        self.parse(field, "a double", |v| v.trim().replace(',', ".").parse::<f64>().ok())
    }

    pub fn datetime(&self, field: &str) -> Result<Option<DateTime<Utc>>, ApiError> {
        self.parse(field, "a datetime", parse_datetime)
    }

    /// Comma-separated integers (`1,2,3`). An empty value is an empty list.
    pub fn int_list(&self, field: &str) -> Result<Option<Vec<i32>>, ApiError> {
        self.parse(field, "an array of integers", |v| {
            if v.trim().is_empty() {
                return Some(Vec::new());
            }
            v.split(',').map(|x| x.trim().parse::<i32>().ok()).collect()
        })
    }

    pub fn take_image(&mut self, field: &str) -> Option<ImageUpload> {
        self.images.remove(field)
    }

    fn parse<T>(
        &self,
        field: &str,
        expected: &str,
        parse: impl FnOnce(&str) -> Option<T>,
    ) -> Result<Option<T>, ApiError> {
        match self.text.get(field) {
            None => Ok(None),
            Some(raw) => parse(raw)
                .map(Some)
                .ok_or_else(|| ApiError::validation(format!("{field} must be {expected}"))),
        }
    }
}

/// Streams an image field, stopping as soon as it passes the size limit.
async fn read_image(mut field: Field<'_>, file_name: &str) -> Result<Bytes, ApiError> {
    check_image(file_name, 0)?;
    let mut buf = BytesMut::new();
    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            // The body limit sits above the image limit.
            Err(err) if err.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                tracing::debug!(error = %err, "image exceeded the body limit");
                return Err(image_too_large().into());
            }
            Err(err) => return Err(unreadable(err)),
        };
        buf.extend_from_slice(&chunk);
        check_image(file_name, buf.len())?;
    }
    Ok(buf.freeze())
}

fn unreadable(err: MultipartError) -> ApiError {
    tracing::debug!(error = %err, "unreadable multipart body");
    ErrorCode::InvalidRequestBody.into()
}

/// RFC 3339, or a naive date/date-time taken as UTC.
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Some(t.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(value, format) {
            return Some(t.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn form(pairs: &[(&'static str, &str)]) -> FormData {
        FormData {
            text: pairs.iter().map(|(k, v)| (*k, v.to_string())).collect(),
            images: HashMap::new(),
        }
    }

    #[test]
    fn typed_accessors_name_the_field() {
        let f = form(&[("Lat", "52,37"), ("MaxRegistrations", "twenty"), ("Exercises", "1, 2,3")]);
        assert_eq!(f.double("Lat").unwrap(), Some(52.37));
        assert_eq!(f.double("Lng").unwrap(), None);
        assert_eq!(
            f.int("MaxRegistrations").unwrap_err().message,
            "MaxRegistrations must be an integer"
        );
        assert_eq!(f.int_list("Exercises").unwrap(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn bad_integer_lists_are_rejected() {
        let f = form(&[("Exercises", "1,x")]);
        assert_eq!(
            f.int_list("Exercises").unwrap_err().message,
            "Exercises must be an array of integers"
        );
    }

    #[test]
    fn field_lookup_is_case_insensitive() {
        assert_eq!(LOCATION_FORM.field("name"), Some("Name"));
        assert_eq!(LOCATION_FORM.image("IMAGE"), Some("Image"));
        assert_eq!(LOCATION_FORM.field("Colour"), None);
    }

    #[test]
    fn datetime_formats() {
        let expected = Utc.with_ymd_and_hms(2020, 1, 1, 20, 0, 0).unwrap();
        assert_eq!(parse_datetime("2020-01-01T20:00"), Some(expected));
        assert_eq!(parse_datetime("2020-01-01T20:00:00Z"), Some(expected));
        assert_eq!(parse_datetime("2020-01-01T21:00:00+01:00"), Some(expected));
        assert_eq!(
            parse_datetime("2020-01-01"),
            Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_datetime("yesterday"), None);
    }
}
