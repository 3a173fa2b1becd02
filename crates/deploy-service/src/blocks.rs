//! Presentation formatter: chat block payloads
//!
//! Pure functions from reconciliation/dispatch results to Block Kit style
//! JSON. No I/O and no failure modes; absent values render as placeholders.
//! Hashes are truncated to 7 characters for display only.

use deploy_common::format::format_date;
use deploy_common::{DispatchReport, ReconciledDeployment};
use serde_json::{json, Value};

use crate::dispatch::Environment;
use crate::reconcile::Classified;

fn or_na(value: Option<&str>) -> &str {
    value.unwrap_or("n/a")
}

fn date_or_na(value: Option<&str>) -> String {
    value.map(format_date).unwrap_or_else(|| "n/a".to_string())
}

/// Full status overview: one field per service with both environments,
/// the latest image, and the latest commit.
pub fn status_blocks(deployments: &[ReconciledDeployment]) -> Value {
    let fields: Vec<Value> = deployments
        .iter()
        .map(|item| {
            let versions = &item.versions;
            let image_version = item
                .latest_images
                .as_ref()
                .and_then(|i| i.version.as_deref());
            let image_sha = item.latest_images.as_ref().and_then(|i| i.short_sha());
            let commit_sha = item.latest_commit.as_ref().map(|c| c.short_sha());
            let commit_date = item.latest_commit.as_ref().map(|c| c.date.as_str());

            json!({
                "type": "mrkdwn",
                "text": format!(
                    "> {} *{}*\n> \n> *Development Version:* \n> `{}` at _{}_\n> \n> *Production Version:* \n> `{}` at _{}_\n> \n> *Latest Image:* \n> `{}` (`{}`)\n> \n> *Latest Commit:* \n> `{}` at _{}_\n\n-\n",
                    item.service.emoji,
                    item.service.title,
                    or_na(versions.development_version.as_deref()),
                    date_or_na(versions.development_date.as_deref()),
                    or_na(versions.production_version.as_deref()),
                    date_or_na(versions.production_date.as_deref()),
                    or_na(image_version),
                    or_na(image_sha),
                    or_na(commit_sha),
                    date_or_na(commit_date),
                ),
            })
        })
        .collect();

    json!([
        {
            "type": "header",
            "text": { "type": "plain_text", "text": "🚀 Deployment Status", "emoji": true }
        },
        { "type": "divider" },
        { "type": "section", "fields": fields },
        { "type": "divider" }
    ])
}

/// Per-service comparison lines shown under a selection checkbox
fn checkbox_description(environment: Environment, item: &ReconciledDeployment) -> String {
    let versions = &item.versions;
    match environment {
        Environment::Development => {
            let image_version = item
                .latest_images
                .as_ref()
                .and_then(|i| i.version.as_deref());
            let image_sha = item.latest_images.as_ref().and_then(|i| i.short_sha());
            let commit_sha = item.latest_commit.as_ref().map(|c| c.short_sha());
            let commit_date = item.latest_commit.as_ref().map(|c| c.date.as_str());

            format!(
                "*Deployed Version:* `{}` at _{}_\n*Latest Image:* `{}` (`{}`)\n*Latest Commit:* `{}` at _{}_",
                or_na(versions.development_version.as_deref()),
                date_or_na(versions.development_date.as_deref()),
                or_na(image_version),
                or_na(image_sha),
                or_na(commit_sha),
                date_or_na(commit_date),
            )
        }
        Environment::Production => format!(
            "*Development Version:* `{}` at _{}_\n*Production Version:* `{}` at _{}_",
            or_na(versions.development_version.as_deref()),
            date_or_na(versions.development_date.as_deref()),
            or_na(versions.production_version.as_deref()),
            date_or_na(versions.production_date.as_deref()),
        ),
    }
}

fn checkbox_option(environment: Environment, item: &ReconciledDeployment) -> Value {
    json!({
        "text": {
            "type": "mrkdwn",
            "text": format!("*{} {}*", item.service.emoji, item.service.title),
        },
        "description": {
            "type": "mrkdwn",
            "text": checkbox_description(environment, item),
        },
        "value": item.service.id,
    })
}

fn checkbox_section(
    environment: Environment,
    label: &str,
    items: &[ReconciledDeployment],
) -> Value {
    let action_id = match environment {
        Environment::Development => "deploy-dev",
        Environment::Production => "deploy-prod",
    };

    json!({
        "type": "section",
        "text": { "type": "mrkdwn", "text": format!("*{label}*\n---") },
        "accessory": {
            "type": "checkboxes",
            "options": items
                .iter()
                .map(|item| checkbox_option(environment, item))
                .collect::<Vec<Value>>(),
            "action_id": action_id,
        }
    })
}

/// Interactive redeploy proposal: recommended and already-updated groups as
/// checkbox sections, a review note, and deploy/cancel buttons.
pub fn proposal_blocks(environment: Environment, classified: &Classified) -> Value {
    let (header, note, deploy_label) = match environment {
        Environment::Development => (
            "🚀 Development Deployment",
            "🔔 *Note:* Select services to deploy to *Development*. Ensure all selections are reviewed before proceeding.",
            "🚀 Deploy to Dev",
        ),
        Environment::Production => (
            "🚀 Production Deployment",
            "🔔 *Note:* Select services to deploy to *Production*. Ensure all selections are reviewed before proceeding.",
            "🚀 Deploy to Prod",
        ),
    };
    let action_prefix = match environment {
        Environment::Development => "deploy-dev",
        Environment::Production => "deploy-prod",
    };

    let mut blocks = vec![
        json!({
            "type": "header",
            "text": { "type": "plain_text", "text": header, "emoji": true }
        }),
        json!({ "type": "divider" }),
    ];

    if !classified.recommended.is_empty() {
        blocks.push(checkbox_section(
            environment,
            "🔄 Recommended Updates",
            &classified.recommended,
        ));
        blocks.push(json!({ "type": "divider" }));
    }

    if !classified.updated.is_empty() {
        blocks.push(checkbox_section(
            environment,
            "✅ Already Updated",
            &classified.updated,
        ));
        blocks.push(json!({ "type": "divider" }));
    }

    blocks.push(json!({
        "type": "context",
        "elements": [{ "type": "mrkdwn", "text": note }]
    }));
    blocks.push(json!({
        "type": "actions",
        "elements": [
            {
                "type": "button",
                "text": { "type": "plain_text", "text": deploy_label, "emoji": true },
                "style": "primary",
                "action_id": format!("{action_prefix}-button"),
            },
            {
                "type": "button",
                "text": { "type": "plain_text", "text": "❌ Cancel", "emoji": true },
                "action_id": format!("{action_prefix}-cancel"),
            }
        ]
    }));

    Value::Array(blocks)
}

/// Per-service dispatch report: a bullet per service with a link to the
/// repository's workflow runs and a status icon.
pub fn dispatch_blocks(environment: Environment, reports: &[DispatchReport]) -> Value {
    let intro = json!({
        "type": "rich_text_section",
        "elements": [{
            "type": "text",
            "text": format!("Deploying services to {environment}... 🚀"),
        }]
    });

    let bullets: Vec<Value> = reports
        .iter()
        .map(|report| {
            json!({
                "type": "rich_text_list",
                "style": "bullet",
                "elements": [{
                    "type": "rich_text_section",
                    "elements": [
                        { "type": "text", "text": format!("{} ", report.service.emoji) },
                        { "type": "text", "text": format!("{} - ", report.service.title) },
                        {
                            "type": "link",
                            "text": "View GitHub Action",
                            "url": format!(
                                "https://github.com/{}/actions",
                                report.service.repository
                            ),
                        },
                        { "type": "text", "text": if report.triggered { " ✅" } else { " ❌" } }
                    ]
                }]
            })
        })
        .collect();

    let mut elements = vec![intro];
    elements.extend(bullets);

    json!([{ "type": "rich_text", "elements": elements }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use deploy_common::{
        ClusterDeployment, DeploymentVersion, LatestCommit, LatestImages, Package, Repository,
        Service, Workflows,
    };

    fn service(id: &str) -> Service {
        Service {
            id: id.to_string(),
            title: "User Service".to_string(),
            emoji: "👤".to_string(),
            package: Package::new("org", id),
            repository: Repository {
                owner: "Org".to_string(),
                repo: "User-Service".to_string(),
                branch: "main".to_string(),
            },
            workflows: Workflows {
                development: "build.yml".to_string(),
                production: "deploy.yml".to_string(),
            },
            cluster: ClusterDeployment {
                repository: Repository {
                    owner: "Org".to_string(),
                    repo: "Cluster".to_string(),
                    branch: "main".to_string(),
                },
                base_path: ClusterDeployment::base_path_for(id),
                development: "development/kustomization.yaml".to_string(),
                production: "production/kustomization.yaml".to_string(),
            },
        }
    }

    fn reconciled(id: &str) -> ReconciledDeployment {
        ReconciledDeployment {
            service: service(id),
            latest_images: Some(LatestImages {
                version: Some("v3".to_string()),
                commit: Some("0123456789abcdef0123456789abcdef01234567".to_string()),
            }),
            latest_commit: Some(LatestCommit {
                commit: "fedcba9876543210fedcba9876543210fedcba98".to_string(),
                date: "2024-01-15T10:30:00+00:00".to_string(),
            }),
            versions: DeploymentVersion {
                development_version: Some("v3".to_string()),
                production_version: Some("v2".to_string()),
                development_date: Some("2024-01-14T09:00:00+00:00".to_string()),
                production_date: Some("2024-01-10T09:00:00+00:00".to_string()),
            },
        }
    }

    #[test]
    fn test_status_blocks_render_truncated_hashes_and_local_dates() {
        let blocks = status_blocks(&[reconciled("users")]);
        let text = blocks[2]["fields"][0]["text"].as_str().unwrap();

        assert!(text.contains("👤 *User Service*"));
        assert!(text.contains("`fedcba9`"));
        assert!(text.contains("`0123456`"));
        assert!(!text.contains("fedcba9876543210"));
        assert!(text.contains("Jan 15 04:00 PM"));
    }

    #[test]
    fn test_status_blocks_render_absent_values_as_na() {
        let mut item = reconciled("users");
        item.versions.production_version = None;
        item.versions.production_date = None;

        let blocks = status_blocks(&[item]);
        let text = blocks[2]["fields"][0]["text"].as_str().unwrap();
        assert!(text.contains("*Production Version:* \n> `n/a` at _n/a_"));
    }

    #[test]
    fn test_proposal_blocks_checkbox_values_are_service_ids() {
        let classified = Classified {
            recommended: vec![reconciled("users")],
            updated: vec![reconciled("payments")],
        };

        let blocks = proposal_blocks(Environment::Development, &classified);
        assert_eq!(blocks[0]["text"]["text"], "🚀 Development Deployment");
        assert_eq!(blocks[2]["accessory"]["options"][0]["value"], "users");
        assert_eq!(blocks[2]["accessory"]["action_id"], "deploy-dev");
        assert_eq!(blocks[4]["accessory"]["options"][0]["value"], "payments");
    }

    #[test]
    fn test_proposal_blocks_omit_empty_groups() {
        let classified = Classified {
            recommended: vec![],
            updated: vec![reconciled("users")],
        };

        let blocks = proposal_blocks(Environment::Production, &classified);
        let sections: Vec<&str> = blocks
            .as_array()
            .unwrap()
            .iter()
            .filter(|b| b["type"] == "section")
            .filter_map(|b| b["text"]["text"].as_str())
            .collect();

        assert_eq!(sections, vec!["*✅ Already Updated*\n---"]);
    }

    #[test]
    fn test_production_proposal_compares_cluster_versions_only() {
        let classified = Classified {
            recommended: vec![reconciled("users")],
            updated: vec![],
        };

        let blocks = proposal_blocks(Environment::Production, &classified);
        let description = blocks[2]["accessory"]["options"][0]["description"]["text"]
            .as_str()
            .unwrap();

        assert!(description.contains("*Development Version:*"));
        assert!(description.contains("*Production Version:*"));
        assert!(!description.contains("*Latest Image:*"));
    }

    #[test]
    fn test_dispatch_blocks_mark_each_outcome() {
        let reports = vec![
            DispatchReport { service: service("users"), triggered: true },
            DispatchReport { service: service("payments"), triggered: false },
        ];

        let blocks = dispatch_blocks(Environment::Development, &reports);
        let elements = blocks[0]["elements"].as_array().unwrap();

        assert_eq!(elements.len(), 3);
        let first = &elements[1]["elements"][0]["elements"];
        let second = &elements[2]["elements"][0]["elements"];
        assert_eq!(first[3]["text"], " ✅");
        assert_eq!(second[3]["text"], " ❌");
        assert_eq!(
            first[2]["url"],
            "https://github.com/Org/User-Service/actions"
        );
    }
}
