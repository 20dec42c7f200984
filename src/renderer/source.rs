use std::{fmt, io::ErrorKind};

use super::{
    error::{Error, Result},
    remote::{ParameterStore, RemoteStores},
};

pub const S3_SCHEME: &str = "s3://";
pub const SSM_SCHEME: &str = "ssm://";

/// Where a template, a variable file or an indirected value is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    Local(String),
    S3 { bucket: String, key: String },
    Ssm(String),
}

impl SourceRef {
    /// Classifies `reference` by its scheme prefix. Anything without a known
    /// prefix is a local path.
    pub fn parse(reference: &str) -> Result<Self> {
        if let Some(rest) = reference.strip_prefix(S3_SCHEME) {
            let (bucket, key) = rest
                .split_once('/')
                .ok_or_else(|| Error::InvalidSource(reference.to_string()))?;
            Ok(SourceRef::S3 {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
        } else if let Some(name) = reference.strip_prefix(SSM_SCHEME) {
            Ok(SourceRef::Ssm(name.to_string()))
        } else {
            Ok(SourceRef::Local(reference.to_string()))
        }
    }

    pub fn is_remote(&self) -> bool {
        !matches!(self, SourceRef::Local(_))
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceRef::Local(path) => write!(f, "{}", path),
            SourceRef::S3 { bucket, key } => write!(f, "{}{}/{}", S3_SCHEME, bucket, key),
            SourceRef::Ssm(name) => write!(f, "{}{}", SSM_SCHEME, name),
        }
    }
}

pub struct SourceReader<'a> {
    remote: Option<&'a dyn RemoteStores>,
}

impl<'a> SourceReader<'a> {
    pub fn new(remote: Option<&'a dyn RemoteStores>) -> Self {
        SourceReader { remote }
    }

    fn remote(&self, source: &SourceRef) -> Result<&'a dyn RemoteStores> {
        self.remote
            .ok_or_else(|| Error::RemoteUnavailable(source.to_string()))
    }

    pub fn parameters(&self) -> Result<&'a dyn ParameterStore> {
        self.remote
            .map(|remote| remote.parameters())
            .ok_or_else(|| Error::RemoteUnavailable(SSM_SCHEME.to_string()))
    }

    pub fn read(&self, source: &SourceRef) -> Result<String> {
        match source {
            SourceRef::Local(path) => std::fs::read_to_string(path).map_err(|e| match e.kind() {
                ErrorKind::NotFound => Error::SourceNotFound(path.clone()),
                _ => Error::Io {
                    path: path.clone(),
                    source: e,
                },
            }),
            SourceRef::S3 { bucket, key } => {
                let body = self.remote(source)?.objects().get_object(bucket, key)?;
                String::from_utf8(body)
                    .map_err(|e| Error::remote("S3", format!("{} is not UTF-8: {}", source, e)))
            }
            SourceRef::Ssm(name) => self.remote(source)?.parameters().get_parameter(name),
        }
    }

    #[cfg(test)]
    pub fn read_str(&self, reference: &str) -> Result<String> {
        self.read(&SourceRef::parse(reference)?)
    }
}
