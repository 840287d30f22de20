//! Round trip against a LocalStack SSM endpoint
//!
//! Requires `--features integration-tests` and a LocalStack instance reachable
//! at `AWS_SSM_ENDPOINT_URL` (default `http://localhost:4566`) with dummy AWS
//! credentials in the environment.

#![cfg(all(feature = "integration-tests", feature = "aws"))]

use secretenv::config::BackendSettings;
use secretenv::secrets::{
    ClientFactory, MemoryEnvironment, ResolverRegistry, SdkClientFactory, SecretEnv,
};
use std::sync::Arc;

#[tokio::test]
async fn test_ssm_parameter_round_trip() {
    let endpoint =
        std::env::var("AWS_SSM_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:4566".to_string());
    let settings = BackendSettings::from_lookup(|name| match name {
        "AWS_SSM_ENDPOINT_URL" => Some(endpoint.clone()),
        other => std::env::var(other).ok(),
    });

    let factory = Arc::new(SdkClientFactory::new());
    let parameter = format!("secretenv/it/{}", uuid::Uuid::new_v4());
    let client = factory.ssm_client(&settings.ssm_client_options("us-east-2").unwrap()).await.unwrap();
    client
        .put_parameter(&parameter, "localstack-value", settings.ssm_kms_key_id.as_deref())
        .await
        .unwrap();

    let env = MemoryEnvironment::new([
        (
            "PARAM".to_string(),
            format!("aws-ssm://arn:aws:ssm:us-east-2:000000000000:parameter/{}:encrypted", parameter),
        ),
        ("AWS_SSM_ENDPOINT_URL".to_string(), endpoint.clone()),
    ]);
    SecretEnv::new(ResolverRegistry::with_factory(factory)).resolve_env(&env).await.unwrap();

    assert_eq!(env.get("PARAM").as_deref(), Some("localstack-value"));
}
