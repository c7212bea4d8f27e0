use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    future::Future,
};

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::loader::url::{has_scheme, resolve_reference};

#[derive(Debug)]
pub enum SchemeError {
    BadDataUri,
}

impl Display for SchemeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SchemeError::BadDataUri => write!(f, "Bad data URI"),
        }
    }
}

impl Error for SchemeError {}

pub(crate) enum Scheme<'a> {
    // Data uri with optional mime type
    Data(Option<&'a str>, Vec<u8>),
    // Relative to the model file
    Relative(&'a str),
    // Any other scheme, handed to the source as is
    Absolute(&'a str),
}

impl<'a> TryFrom<&'a str> for Scheme<'a> {
    type Error = SchemeError;

    fn try_from(uri: &'a str) -> Result<Self, Self::Error> {
        let is_data = uri
            .get(0..5)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data:"));
        if is_data {
            // Data URI: rfc2397
            let content = &uri[5..];
            let Some((param, value)) = content.split_once(',') else {
                return Err(SchemeError::BadDataUri);
            };
            if let Some((mime, encoding)) = param.split_once(';') {
                if encoding.eq_ignore_ascii_case("base64") {
                    let data = STANDARD
                        .decode(value)
                        .map_err(|_| SchemeError::BadDataUri)?;
                    let mime = (!mime.is_empty()).then_some(mime);
                    Ok(Scheme::Data(mime, data))
                } else {
                    Err(SchemeError::BadDataUri)
                }
            } else {
                // The default of text/plain makes no sense for buffers and
                // images, leave the type to be guessed from the data.
                Ok(Scheme::Data(None, Vec::from(value.as_bytes())))
            }
        } else if has_scheme(uri) {
            Ok(Scheme::Absolute(uri))
        } else {
            Ok(Scheme::Relative(uri))
        }
    }
}

type SchemeData<'a> = (Option<&'a str>, Vec<u8>);

impl<'a> Scheme<'a> {
    /// Returns the data of this URI, fetching it relative to `base` if
    /// needed.
    pub(crate) async fn load<F, Fut, E>(self, base: &str, fetch: &F) -> Result<SchemeData<'a>, E>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<Vec<u8>, E>>,
    {
        match self {
            Scheme::Data(mime, data) => Ok((mime, data)),
            Scheme::Relative(path) => {
                let data = fetch(resolve_reference(base, path)).await?;
                Ok((None, data))
            }
            Scheme::Absolute(url) => {
                let data = fetch(url.to_string()).await?;
                Ok((None, data))
            }
        }
    }
}
