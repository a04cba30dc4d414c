//! The response envelope every NextStep endpoint wraps its payload in.

use serde::Deserialize;

use crate::Result;
use crate::error::{Error, ServiceFailure};

/// `{ success, message, data, errorCode? }`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
    #[serde(default)]
    pub error_code: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap `data`, treating `success: false` and a non-2xx `status`
    /// uniformly as failure.
    pub fn into_result(self, status: u16) -> Result<T> {
        let ok_status = (200..300).contains(&status);
        if ok_status && self.success {
            return self.data.ok_or_else(|| {
                Error::Service(ServiceFailure::new(
                    status,
                    self.error_code,
                    Some("response envelope carried no data".to_string()),
                ))
            });
        }
        Err(ServiceFailure::new(status, self.error_code, self.message).classify(ok_status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unwraps_data_on_success() {
        let envelope: ApiEnvelope<u32> = serde_json::from_value(json!({
            "success": true,
            "message": "ok",
            "data": 7
        }))
        .unwrap();
        assert_eq!(envelope.into_result(200).unwrap(), 7);
    }

    #[test]
    fn success_false_on_2xx_is_validation_failure() {
        let envelope: ApiEnvelope<u32> = serde_json::from_value(json!({
            "success": false,
            "message": "Passwords do not match",
            "data": null,
            "errorCode": "PASSWORD_MISMATCH"
        }))
        .unwrap();
        let err = envelope.into_result(200).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(err.error_code(), Some("PASSWORD_MISMATCH"));
    }

    #[test]
    fn non_2xx_is_failure_even_if_success_true() {
        let envelope: ApiEnvelope<u32> = serde_json::from_value(json!({
            "success": true,
            "message": "odd",
            "data": 1
        }))
        .unwrap();
        assert!(matches!(
            envelope.into_result(500).unwrap_err(),
            Error::Service(_)
        ));
    }

    #[test]
    fn missing_data_is_service_error() {
        let envelope: ApiEnvelope<u32> =
            serde_json::from_value(json!({ "success": true, "message": "ok" })).unwrap();
        assert!(matches!(
            envelope.into_result(200).unwrap_err(),
            Error::Service(_)
        ));
    }
}
