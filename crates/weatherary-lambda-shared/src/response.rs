use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use weatherary_lib::HandlerResponse;

/// API Gateway proxy integration response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayProxyResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl From<HandlerResponse> for ApiGatewayProxyResponse {
    fn from(response: HandlerResponse) -> Self {
        let headers = HashMap::from([(
            "Content-Type".to_string(),
            response.content_type().to_string(),
        )]);
        Self {
            status_code: response.status,
            headers,
            body: response.body_string(),
            is_base64_encoded: false,
        }
    }
}
