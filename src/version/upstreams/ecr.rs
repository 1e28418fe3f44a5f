//! AWS ECR upstream
//!
//! Queries through the `aws` CLI so that credentials, profiles and SSO stay
//! the CLI's business.

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::config::AWS_PROGRAM;
use crate::spec::enrich::Locator;
use crate::version::error::UpstreamError;
use crate::version::schema::SourceKind;
use crate::version::upstream::Upstream;
use crate::version::upstreams::command::run;

/// Output of `aws ecr describe-images`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeImages {
    #[serde(default)]
    image_details: Vec<ImageDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageDetail {
    image_digest: Option<String>,
    #[serde(default)]
    image_tags: Vec<String>,
    image_pushed_at: Option<Value>,
}

/// Upstream implementation for ECR repositories
pub struct EcrUpstream {
    program: String,
}

impl EcrUpstream {
    /// Creates a new EcrUpstream running `program` in place of `aws`
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    fn args(account_id: &str, region: &str, image: &str) -> Vec<String> {
        [
            "ecr",
            "describe-images",
            "--registry-id",
            account_id,
            "--region",
            region,
            "--repository-name",
            image,
            "--output",
            "json",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    /// One record per tag; untagged images have no version and are skipped
    fn parse(output: &str) -> Result<Vec<Value>, UpstreamError> {
        let described: DescribeImages = serde_json::from_str(output)
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?;

        Ok(described
            .image_details
            .into_iter()
            .flat_map(|detail| {
                let digest = detail.image_digest;
                let pushed_at = detail.image_pushed_at;
                detail.image_tags.into_iter().map(move |tag| {
                    json!({
                        "tag": tag,
                        "imageDigest": digest,
                        "imagePushedAt": pushed_at,
                    })
                })
            })
            .collect())
    }
}

impl Default for EcrUpstream {
    fn default() -> Self {
        Self::new(AWS_PROGRAM)
    }
}

#[async_trait::async_trait]
impl Upstream for EcrUpstream {
    fn source_kind(&self) -> SourceKind {
        SourceKind::DockerEcr
    }

    async fn fetch_records(&self, locator: &Locator) -> Result<Vec<Value>, UpstreamError> {
        let Locator::DockerEcr {
            account_id,
            region,
            image,
            ..
        } = locator
        else {
            return Err(UpstreamError::Unsupported(format!("{:?}", locator)));
        };

        let output = run(&self.program, &Self::args(account_id, region, image), None).await?;
        let records = Self::parse(&output)?;
        debug!("Fetched {} tags for ECR repository {}", records.len(), image);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_explodes_tags_into_records() {
        let records = EcrUpstream::parse(
            r#"{
                "imageDetails": [
                    {
                        "imageDigest": "sha256:aaa",
                        "imageTags": ["1.4.0", "latest"],
                        "imagePushedAt": "2023-06-01T12:00:00-07:00"
                    },
                    {
                        "imageDigest": "sha256:bbb",
                        "imagePushedAt": 1672531200.0
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["tag"], "1.4.0");
        assert_eq!(records[1]["tag"], "latest");
        assert_eq!(records[1]["imageDigest"], "sha256:aaa");
    }

    #[test]
    fn parse_rejects_non_json_output() {
        assert!(matches!(
            EcrUpstream::parse("not json"),
            Err(UpstreamError::InvalidResponse(_))
        ));
    }

    #[test]
    fn args_name_registry_region_and_repository() {
        let args = EcrUpstream::args("123456789012", "us-west-2", "service");
        assert_eq!(
            args.join(" "),
            "ecr describe-images --registry-id 123456789012 --region us-west-2 \
             --repository-name service --output json"
        );
    }

    #[tokio::test]
    async fn fetch_records_runs_program_and_parses_output() {
        let upstream = EcrUpstream::new("echo");
        let locator = Locator::DockerEcr {
            registry: "123456789012.dkr.ecr.us-west-2.amazonaws.com".to_string(),
            account_id: "123456789012".to_string(),
            region: "us-west-2".to_string(),
            image: "service".to_string(),
        };

        // `echo` prints its arguments, which is not JSON
        let result = upstream.fetch_records(&locator).await;
        assert!(matches!(result, Err(UpstreamError::InvalidResponse(_))));
    }
}
