use std::path::PathBuf;

/// How `aws s3` should authenticate an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum S3Credentials {
    KeyPair { key: String, secret: String },
    File(PathBuf),
}

impl S3Credentials {
    /// Environment for the `aws` subprocess.
    pub fn to_env_vars(&self) -> Vec<(String, String)> {
        match self {
            S3Credentials::KeyPair { key, secret } => vec![
                ("AWS_ACCESS_KEY_ID".to_string(), key.clone()),
                ("AWS_SECRET_ACCESS_KEY".to_string(), secret.clone()),
            ],
            S3Credentials::File(path) => vec![(
                "AWS_SHARED_CREDENTIALS_FILE".to_string(),
                path.display().to_string(),
            )],
        }
    }
}
