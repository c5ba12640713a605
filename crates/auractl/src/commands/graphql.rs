//! GraphQL Data API commands

use std::path::Path;

use auractl_core::ResourceKind;
use base64::engine::general_purpose::STANDARD;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use base64::{Engine as _, alphabet};
use serde::Serialize;
use tracing::{debug, info};

use crate::cli::GraphqlCommands;
use crate::commands::await_utils::{AwaitTarget, wait_for};
use crate::commands::{data_field, print_response};
use crate::connection::ConnectionManager;
use crate::error::{AuraCtlError, Result as CliResult};

const GRAPHQL_FIELDS: &[&str] = &["id", "name", "status", "url"];
const CREATED_FIELDS: &[&str] = &["id", "name", "status", "url", "authentication_providers"];

/// Accepts non-zero trailing bits, which other Aura clients send
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

const API_KEY_NOTICE: &str = "\
###############################
# An API key was created. Store it now: it cannot be retrieved or changed later.
#
# If you lose the API key, create a new authentication provider.
# This does not lose any data.
###############################";

#[derive(Debug, Serialize)]
struct InstanceLogin<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct AuthenticationProvider {
    #[serde(rename = "type")]
    provider_type: &'static str,
    name: &'static str,
    enabled: bool,
}

#[derive(Debug, Serialize)]
struct Security {
    authentication_providers: Vec<AuthenticationProvider>,
}

#[derive(Debug, Serialize)]
struct Features {
    subgraph: bool,
}

#[derive(Debug, Serialize)]
struct CreateGraphqlRequest<'a> {
    name: &'a str,
    aura_instance: InstanceLogin<'a>,
    type_definitions: String,
    security: Security,
    #[serde(skip_serializing_if = "Option::is_none")]
    features: Option<Features>,
}

#[derive(Debug, Default, Serialize)]
struct UpdateGraphqlRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aura_instance: Option<InstanceLogin<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    type_definitions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    features: Option<Features>,
}

impl UpdateGraphqlRequest<'_> {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.aura_instance.is_none()
            && self.type_definitions.is_none()
            && self.features.is_none()
    }
}

pub fn handle_graphql_command(cmd: &GraphqlCommands, conn_mgr: &ConnectionManager) -> CliResult<()> {
    let client = conn_mgr.create_client()?;
    let output = conn_mgr.config.output;

    match cmd {
        GraphqlCommands::List { instance_id } => {
            let response = client.get(&data_apis_path(instance_id))?;
            print_response(&response, output, GRAPHQL_FIELDS, "No GraphQL Data APIs")?;
        }

        GraphqlCommands::Get { id, instance_id } => {
            let response = client.get(&data_api_path(instance_id, id))?;
            print_response(&response, output, GRAPHQL_FIELDS, "")?;
        }

        GraphqlCommands::Create {
            instance_id,
            name,
            instance_username,
            instance_password,
            type_definitions,
            type_definitions_file,
            feature_subgraph_enabled,
            wait,
        } => {
            let type_definitions = resolve_type_definitions(
                type_definitions.as_deref(),
                type_definitions_file.as_deref(),
            )?
            .ok_or_else(|| AuraCtlError::InvalidInput {
                message: "either --type-definitions or --type-definitions-file is required"
                    .to_string(),
            })?;
            type_definitions.check_schema()?;

            let request = CreateGraphqlRequest {
                name,
                aura_instance: InstanceLogin {
                    username: Some(instance_username),
                    password: Some(instance_password),
                },
                type_definitions: type_definitions.encoded,
                security: Security {
                    authentication_providers: vec![AuthenticationProvider {
                        provider_type: "api-key",
                        name: "default",
                        enabled: true,
                    }],
                },
                features: feature_subgraph_enabled.map(|subgraph| Features { subgraph }),
            };

            info!("Creating GraphQL Data API '{}' on instance {}", name, instance_id);
            let response = client.post(&data_apis_path(instance_id), &request)?;
            eprintln!("{}", API_KEY_NOTICE);
            let body = print_response(&response, output, CREATED_FIELDS, "")?;

            if *wait {
                let id = data_field(&body, "id")?;
                wait_for(
                    conn_mgr,
                    &client,
                    ResourceKind::GraphqlDataApi,
                    &id,
                    &data_api_path(instance_id, &id),
                    AwaitTarget::Status(&["ready"]),
                )?;
            }
        }

        GraphqlCommands::Update {
            id,
            instance_id,
            name,
            instance_username,
            instance_password,
            type_definitions,
            type_definitions_file,
            feature_subgraph_enabled,
            wait,
        } => {
            let aura_instance = (instance_username.is_some() || instance_password.is_some())
                .then(|| InstanceLogin {
                    username: instance_username.as_deref(),
                    password: instance_password.as_deref(),
                });
            let request = UpdateGraphqlRequest {
                name: name.as_deref(),
                aura_instance,
                type_definitions: resolve_type_definitions(
                    type_definitions.as_deref(),
                    type_definitions_file.as_deref(),
                )?
                .map(|defs| defs.encoded),
                features: feature_subgraph_enabled.map(|subgraph| Features { subgraph }),
            };
            if request.is_empty() {
                return Err(AuraCtlError::InvalidInput {
                    message: "nothing to update, pass at least one field to change".to_string(),
                });
            }

            let response = client.patch(&data_api_path(instance_id, id), &request)?;
            print_response(&response, output, GRAPHQL_FIELDS, "")?;

            if *wait {
                wait_for(
                    conn_mgr,
                    &client,
                    ResourceKind::GraphqlDataApi,
                    id,
                    &data_api_path(instance_id, id),
                    AwaitTarget::Settled,
                )?;
            }
        }

        GraphqlCommands::Delete {
            id,
            instance_id,
            wait,
        } => {
            let response = client.delete(&data_api_path(instance_id, id))?;
            print_response(
                &response,
                output,
                GRAPHQL_FIELDS,
                &format!("GraphQL Data API {} is being deleted", id),
            )?;

            if *wait {
                wait_for(
                    conn_mgr,
                    &client,
                    ResourceKind::GraphqlDataApi,
                    id,
                    &data_api_path(instance_id, id),
                    AwaitTarget::Deleted,
                )?;
            }
        }
    }

    Ok(())
}

fn data_apis_path(instance_id: &str) -> String {
    format!("/instances/{}/data-apis/graphql", instance_id)
}

fn data_api_path(instance_id: &str, data_api_id: &str) -> String {
    format!("{}/{}", data_apis_path(instance_id), data_api_id)
}

/// Type definitions as sent to the API, with the schema text they encode
#[derive(Debug)]
struct TypeDefinitions {
    encoded: String,
    decoded: Vec<u8>,
}

impl TypeDefinitions {
    /// Parse the decoded text as a GraphQL schema document
    fn check_schema(&self) -> CliResult<()> {
        let text = std::str::from_utf8(&self.decoded).map_err(|_| AuraCtlError::InvalidInput {
            message: "type definitions must be UTF-8 text".to_string(),
        })?;
        if text.trim().is_empty() {
            return Err(AuraCtlError::InvalidInput {
                message: "type definitions are empty".to_string(),
            });
        }
        graphql_parser::parse_schema::<&str>(text).map_err(|e| AuraCtlError::InvalidInput {
            message: format!("provided type definitions are invalid: {}", e),
        })?;
        Ok(())
    }
}

/// Type definitions for a request body, from an inline base64 value or a file
fn resolve_type_definitions(
    inline: Option<&str>,
    file: Option<&str>,
) -> CliResult<Option<TypeDefinitions>> {
    match (inline, file) {
        (Some(_), Some(_)) => Err(AuraCtlError::InvalidInput {
            message: "only one of --type-definitions or --type-definitions-file can be provided"
                .to_string(),
        }),
        (Some(encoded), None) => decode_inline(encoded).map(Some),
        (None, Some(path)) => encode_file(Path::new(path)).map(Some),
        (None, None) => Ok(None),
    }
}

/// The value is forwarded exactly as given once it decodes
fn decode_inline(encoded: &str) -> CliResult<TypeDefinitions> {
    let encoded = encoded.trim();
    let decoded = LENIENT_BASE64
        .decode(encoded)
        .map_err(|_| AuraCtlError::InvalidInput {
            message: "provided type definitions are not valid base64".to_string(),
        })?;
    Ok(TypeDefinitions {
        encoded: encoded.to_string(),
        decoded,
    })
}

fn encode_file(path: &Path) -> CliResult<TypeDefinitions> {
    if path.extension().and_then(|ext| ext.to_str()) != Some("graphql") {
        return Err(AuraCtlError::InvalidInput {
            message: format!(
                "type definitions file '{}' must have file type '.graphql'",
                path.display()
            ),
        });
    }

    let contents = std::fs::read(path).map_err(|e| AuraCtlError::FileError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    debug!("Read {} bytes of type definitions from {}", contents.len(), path.display());
    Ok(TypeDefinitions {
        encoded: STANDARD.encode(&contents),
        decoded: contents,
    })
}
