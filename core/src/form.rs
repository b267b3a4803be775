//! multipart/form-data encoding for POST bodies.
//!
//! Keys beginning with `_` are client-only fields and are never transmitted.

use uuid::Uuid;

use crate::params::Params;

/// Prefix marking a parameter that stays on the client.
pub const CLIENT_ONLY_PREFIX: char = '_';

/// An encoded multipart form: the header value and the body to send with it.
#[derive(Debug, Clone)]
pub struct MultipartForm {
    boundary: String,
    fields: Vec<(String, String)>,
}

impl MultipartForm {
    /// Collect the transmittable fields of `params` in insertion order.
    pub fn from_params(params: &Params) -> Self {
        let fields = params
            .iter()
            .filter(|(k, _)| !k.starts_with(CLIENT_ONLY_PREFIX))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            boundary: gen_boundary(),
            fields,
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn encode(&self) -> String {
        let mut body = String::new();
        for (name, value) in &self.fields {
            body.push_str("--");
            body.push_str(&self.boundary);
            body.push_str("\r\nContent-Disposition: form-data; name=\"");
            body.push_str(&escape_name(name));
            body.push_str("\"\r\n\r\n");
            body.push_str(value);
            body.push_str("\r\n");
        }
        body.push_str("--");
        body.push_str(&self.boundary);
        body.push_str("--\r\n");
        body
    }
}

fn gen_boundary() -> String {
    format!("----wanfetch{}", Uuid::new_v4().simple())
}

fn escape_name(name: &str) -> String {
    name.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underscore_keys_are_not_transmitted() {
        let params = Params::new()
            .with("username", "ada")
            .with("_remember", true)
            .with("password", "secret");
        let form = MultipartForm::from_params(&params);
        let names: Vec<_> = form.fields().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["username", "password"]);

        let body = form.encode();
        assert!(!body.contains("_remember"));
        assert!(body.contains("name=\"username\"\r\n\r\nada\r\n"));
        assert!(body.contains("name=\"password\"\r\n\r\nsecret\r\n"));
    }

    #[test]
    fn body_is_framed_by_boundary() {
        let form = MultipartForm::from_params(&Params::new().with("k", 1));
        let body = form.encode();
        assert!(body.starts_with(&format!("--{}\r\n", form.boundary())));
        assert!(body.ends_with(&format!("--{}--\r\n", form.boundary())));
        assert_eq!(
            form.content_type(),
            format!("multipart/form-data; boundary={}", form.boundary())
        );
    }

    #[test]
    fn empty_form_has_only_closing_delimiter() {
        let form = MultipartForm::from_params(&Params::new().with("_only", "local"));
        assert!(form.fields().is_empty());
        assert_eq!(form.encode(), format!("--{}--\r\n", form.boundary()));
    }

    #[test]
    fn boundaries_differ_per_form() {
        let a = MultipartForm::from_params(&Params::new());
        let b = MultipartForm::from_params(&Params::new());
        assert_ne!(a.boundary(), b.boundary());
    }

    #[test]
    fn quotes_in_names_are_escaped() {
        let form = MultipartForm::from_params(&Params::new().with("a\"b", "v"));
        assert!(form.encode().contains("name=\"a\\\"b\""));
    }
}
