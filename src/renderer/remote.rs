use std::{
    cell::OnceCell,
    collections::{BTreeMap, BTreeSet, HashMap},
};

use aws_config::{BehaviorVersion, SdkConfig};
use tokio::runtime::Runtime;

use super::error::{Error, Result};

pub trait ObjectStore {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;
}

pub trait ParameterStore {
    /// Fetches one decrypted parameter value.
    fn get_parameter(&self, name: &str) -> Result<String>;
    /// Fetches every name in a single request. Names unknown to the store are
    /// left out of the returned map.
    fn get_parameters(&self, names: &[String]) -> Result<HashMap<String, String>>;
}

/// The remote backends of one run.
pub trait RemoteStores {
    fn objects(&self) -> &dyn ObjectStore;
    fn parameters(&self) -> &dyn ParameterStore;
}

/// S3 and SSM through the AWS SDK. Credentials and region come from the
/// default provider chain. Each client is built on first use and then reused.
pub struct AwsRemote {
    runtime: Runtime,
    config: SdkConfig,
    s3: OnceCell<aws_sdk_s3::Client>,
    ssm: OnceCell<aws_sdk_ssm::Client>,
}

impl AwsRemote {
    pub fn connect() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::remote("AWS", e))?;
        let config = runtime.block_on(aws_config::defaults(BehaviorVersion::latest()).load());

        Ok(AwsRemote {
            runtime,
            config,
            s3: OnceCell::new(),
            ssm: OnceCell::new(),
        })
    }

    fn s3(&self) -> &aws_sdk_s3::Client {
        self.s3.get_or_init(|| {
            log::debug!("Creating S3 client");
            aws_sdk_s3::Client::new(&self.config)
        })
    }

    fn ssm(&self) -> &aws_sdk_ssm::Client {
        self.ssm.get_or_init(|| {
            log::debug!("Creating SSM client");
            aws_sdk_ssm::Client::new(&self.config)
        })
    }
}

impl RemoteStores for AwsRemote {
    fn objects(&self) -> &dyn ObjectStore {
        self
    }

    fn parameters(&self) -> &dyn ParameterStore {
        self
    }
}

impl ObjectStore for AwsRemote {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.runtime.block_on(async {
            let output = self
                .s3()
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| Error::remote("S3", aws_sdk_s3::error::DisplayErrorContext(e)))?;
            let body = output
                .body
                .collect()
                .await
                .map_err(|e| Error::remote("S3", e))?;
            Ok::<_, Error>(body.into_bytes().to_vec())
        })
    }
}

impl ParameterStore for AwsRemote {
    fn get_parameter(&self, name: &str) -> Result<String> {
        let output = self
            .runtime
            .block_on(
                self.ssm()
                    .get_parameter()
                    .name(name)
                    .with_decryption(true)
                    .send(),
            )
            .map_err(|e| Error::remote("SSM", aws_sdk_ssm::error::DisplayErrorContext(e)))?;

        output
            .parameter()
            .and_then(|parameter| parameter.value())
            .map(str::to_string)
            .ok_or_else(|| Error::remote("SSM", format!("parameter {} has no value", name)))
    }

    fn get_parameters(&self, names: &[String]) -> Result<HashMap<String, String>> {
        let output = self
            .runtime
            .block_on(
                self.ssm()
                    .get_parameters()
                    .set_names(Some(names.to_vec()))
                    .with_decryption(true)
                    .send(),
            )
            .map_err(|e| Error::remote("SSM", aws_sdk_ssm::error::DisplayErrorContext(e)))?;

        Ok(output
            .parameters()
            .iter()
            .filter_map(|parameter| {
                Some((
                    parameter.name()?.to_string(),
                    parameter.value()?.to_string(),
                ))
            })
            .collect())
    }
}

/// Resolves `variable -> parameter name` with exactly one batched request and
/// maps every variable back to its parameter's value. Fails if the response
/// lacks any of the requested parameters.
pub fn resolve_parameters(
    store: &dyn ParameterStore,
    pending: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>> {
    let names: Vec<String> = pending
        .values()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let found = store.get_parameters(&names)?;

    let missing: Vec<String> = names
        .iter()
        .filter(|name| !found.contains_key(*name))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingParameters(missing));
    }

    Ok(pending
        .iter()
        .map(|(variable, name)| (variable.clone(), found[name].clone()))
        .collect())
}
