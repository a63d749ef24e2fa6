//! CloudFormation template synthesis.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::config::validation::ValidationError;

/// Retention periods accepted by CloudWatch Logs, in days.
pub const RETENTION_DAYS: &[u32] = &[
    1, 3, 5, 7, 14, 30, 60, 90, 120, 150, 180, 365, 400, 545, 731, 1096, 1827, 2192, 2557, 2922,
    3288, 3653,
];

const MAX_TIMEOUT_SECS: u64 = 900;

/// Description of the deployed resources.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StackConfig {
    /// Function name; also names the log group.
    pub function_name: String,

    /// Container image URI for the function.
    pub image_uri: String,

    /// Function timeout in seconds.
    pub timeout_secs: u64,

    /// Log retention in days.
    pub log_retention_days: u32,

    /// REST API name.
    pub api_name: String,

    /// Deployment stage name.
    pub stage_name: String,

    /// Require an API key (and usage plan) on every request.
    pub api_key_required: bool,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            function_name: "ApiHandler".to_string(),
            image_uri: "${ImageUri}".to_string(),
            timeout_secs: 30,
            log_retention_days: 7,
            api_name: "ApiRest".to_string(),
            stage_name: "prod".to_string(),
            api_key_required: false,
        }
    }
}

impl StackConfig {
    /// Semantic checks, reported under the `stack.` prefix.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.function_name.is_empty() {
            errors.push(ValidationError::new("stack.function_name", "must not be empty"));
        }
        if self.image_uri.is_empty() {
            errors.push(ValidationError::new("stack.image_uri", "must not be empty"));
        }
        if self.timeout_secs == 0 || self.timeout_secs > MAX_TIMEOUT_SECS {
            errors.push(ValidationError::new(
                "stack.timeout_secs",
                format!("must be between 1 and {}", MAX_TIMEOUT_SECS),
            ));
        }
        if !RETENTION_DAYS.contains(&self.log_retention_days) {
            errors.push(ValidationError::new(
                "stack.log_retention_days",
                format!("{} is not a supported retention period", self.log_retention_days),
            ));
        }
        if self.api_name.is_empty() {
            errors.push(ValidationError::new("stack.api_name", "must not be empty"));
        }
        if self.stage_name.is_empty() || !self.stage_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            errors.push(ValidationError::new(
                "stack.stage_name",
                "must be non-empty and contain only letters, digits or '_'",
            ));
        }

        errors
    }
}

/// Render the stack as a CloudFormation template.
pub fn synthesize(config: &StackConfig) -> Value {
    let mut resources = Map::new();

    resources.insert(
        "ApiHandlerRole".into(),
        json!({
            "Type": "AWS::IAM::Role",
            "Properties": {
                "AssumeRolePolicyDocument": {
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Effect": "Allow",
                        "Principal": { "Service": "lambda.amazonaws.com" },
                        "Action": "sts:AssumeRole"
                    }]
                },
                "ManagedPolicyArns": [
                    { "Fn::Sub": "arn:${AWS::Partition}:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole" }
                ]
            }
        }),
    );

    resources.insert(
        "ApiHandler".into(),
        json!({
            "Type": "AWS::Lambda::Function",
            "Properties": {
                "FunctionName": config.function_name,
                "PackageType": "Image",
                "Code": { "ImageUri": config.image_uri },
                "Timeout": config.timeout_secs,
                "Role": { "Fn::GetAtt": ["ApiHandlerRole", "Arn"] }
            }
        }),
    );

    resources.insert(
        "ApiHandlerLogGroup".into(),
        json!({
            "Type": "AWS::Logs::LogGroup",
            "Properties": {
                "LogGroupName": format!("/aws/lambda/{}", config.function_name),
                "RetentionInDays": config.log_retention_days
            }
        }),
    );

    resources.insert(
        "Api".into(),
        json!({
            "Type": "AWS::ApiGateway::RestApi",
            "Properties": { "Name": config.api_name }
        }),
    );

    resources.insert(
        "ApiProxyResource".into(),
        json!({
            "Type": "AWS::ApiGateway::Resource",
            "Properties": {
                "RestApiId": { "Ref": "Api" },
                "ParentId": { "Fn::GetAtt": ["Api", "RootResourceId"] },
                "PathPart": "{proxy+}"
            }
        }),
    );

    resources.insert(
        "ApiRootMethod".into(),
        proxy_method(json!({ "Fn::GetAtt": ["Api", "RootResourceId"] }), config.api_key_required),
    );
    resources.insert(
        "ApiProxyMethod".into(),
        proxy_method(json!({ "Ref": "ApiProxyResource" }), config.api_key_required),
    );

    resources.insert(
        "ApiInvokePermission".into(),
        json!({
            "Type": "AWS::Lambda::Permission",
            "Properties": {
                "Action": "lambda:InvokeFunction",
                "FunctionName": { "Fn::GetAtt": ["ApiHandler", "Arn"] },
                "Principal": "apigateway.amazonaws.com",
                "SourceArn": { "Fn::Sub": "arn:${AWS::Partition}:execute-api:${AWS::Region}:${AWS::AccountId}:${Api}/*/*/*" }
            }
        }),
    );

    resources.insert(
        "ApiDeployment".into(),
        json!({
            "Type": "AWS::ApiGateway::Deployment",
            "DependsOn": ["ApiRootMethod", "ApiProxyMethod"],
            "Properties": { "RestApiId": { "Ref": "Api" } }
        }),
    );

    resources.insert(
        "ApiStage".into(),
        json!({
            "Type": "AWS::ApiGateway::Stage",
            "Properties": {
                "RestApiId": { "Ref": "Api" },
                "DeploymentId": { "Ref": "ApiDeployment" },
                "StageName": config.stage_name
            }
        }),
    );

    let mut outputs = Map::new();
    outputs.insert(
        "ApiUrl".into(),
        json!({
            "Value": {
                "Fn::Sub": format!(
                    "https://${{Api}}.execute-api.${{AWS::Region}}.${{AWS::URLSuffix}}/{}/",
                    config.stage_name
                )
            }
        }),
    );

    if config.api_key_required {
        resources.insert(
            "ApiKey".into(),
            json!({
                "Type": "AWS::ApiGateway::ApiKey",
                "DependsOn": ["ApiStage"],
                "Properties": { "Enabled": true }
            }),
        );
        resources.insert(
            "ApiUsagePlan".into(),
            json!({
                "Type": "AWS::ApiGateway::UsagePlan",
                "Properties": {
                    "UsagePlanName": "ApiUsagePlan",
                    "ApiStages": [{
                        "ApiId": { "Ref": "Api" },
                        "Stage": { "Ref": "ApiStage" }
                    }]
                }
            }),
        );
        resources.insert(
            "ApiUsagePlanKey".into(),
            json!({
                "Type": "AWS::ApiGateway::UsagePlanKey",
                "Properties": {
                    "KeyId": { "Ref": "ApiKey" },
                    "KeyType": "API_KEY",
                    "UsagePlanId": { "Ref": "ApiUsagePlan" }
                }
            }),
        );
        outputs.insert(
            "keyId".into(),
            json!({
                "Value": { "Ref": "ApiKey" },
                "Export": { "Name": "keyId" }
            }),
        );
    }

    json!({
        "AWSTemplateFormatVersion": "2010-09-09",
        "Description": format!("{} behind {}", config.function_name, config.api_name),
        "Resources": resources,
        "Outputs": outputs,
    })
}

fn proxy_method(resource_id: Value, api_key_required: bool) -> Value {
    json!({
        "Type": "AWS::ApiGateway::Method",
        "Properties": {
            "RestApiId": { "Ref": "Api" },
            "ResourceId": resource_id,
            "HttpMethod": "ANY",
            "AuthorizationType": "NONE",
            "ApiKeyRequired": api_key_required,
            "Integration": {
                "Type": "AWS_PROXY",
                "IntegrationHttpMethod": "POST",
                "Uri": {
                    "Fn::Sub": "arn:${AWS::Partition}:apigateway:${AWS::Region}:lambda:path/2015-03-31/functions/${ApiHandler.Arn}/invocations"
                }
            }
        }
    })
}
