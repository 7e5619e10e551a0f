//! Conversions from external infrastructure errors into domain errors.

use gardenwise_domain::GardenwiseError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub GardenwiseError);

impl From<InfraError> for GardenwiseError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<GardenwiseError> for InfraError {
    fn from(value: GardenwiseError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoGardenwiseError {
    fn into_gardenwise(self) -> GardenwiseError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → GardenwiseError */
/* -------------------------------------------------------------------------- */

impl IntoGardenwiseError for SqlError {
    fn into_gardenwise(self) -> GardenwiseError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        GardenwiseError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        GardenwiseError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 1555 | 2067) => {
                        GardenwiseError::Database("unique constraint violation".into())
                    }
                    _ => GardenwiseError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => GardenwiseError::Database("query returned no rows".into()),
            // statement or binding mistakes fail the same way on every retry
            other @ (RE::InvalidQuery
            | RE::ExecuteReturnedResults
            | RE::InvalidParameterName(_)
            | RE::InvalidParameterCount(_, _)
            | RE::InvalidColumnIndex(_)
            | RE::InvalidColumnName(_)) => {
                GardenwiseError::Internal(format!("invalid sqlite statement: {other}"))
            }
            RE::FromSqlConversionFailure(_, _, cause) => {
                GardenwiseError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                GardenwiseError::Database(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => {
                GardenwiseError::Database("invalid UTF-8 returned from sqlite".into())
            }
            RE::InvalidPath(path) => GardenwiseError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => GardenwiseError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_gardenwise())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → GardenwiseError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(GardenwiseError::Database(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → GardenwiseError */
/* -------------------------------------------------------------------------- */

impl IntoGardenwiseError for HttpError {
    fn into_gardenwise(self) -> GardenwiseError {
        if self.is_timeout() {
            return GardenwiseError::Timeout("HTTP request timed out".into());
        }

        if self.is_connect() {
            return GardenwiseError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                400..=499 if code != 408 && code != 429 => GardenwiseError::InvalidRequest(message),
                _ => GardenwiseError::Network(message),
            };
        }

        GardenwiseError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_gardenwise())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use reqwest::{Client, StatusCode};
    use rusqlite::ffi::{Error as FfiError, ErrorCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn sqlite_busy_maps_to_database_error() {
        let err = SqlError::SqliteFailure(
            FfiError { code: ErrorCode::DatabaseBusy, extended_code: 5 },
            Some("database is locked".into()),
        );

        let mapped: GardenwiseError = InfraError::from(err).into();
        match mapped {
            GardenwiseError::Database(msg) => {
                assert!(msg.contains("busy") || msg.contains("locked"));
            }
            other => panic!("expected database error, got {:?}", other),
        }
    }

    #[test]
    fn busy_database_is_retryable() {
        let err = SqlError::SqliteFailure(
            FfiError { code: ErrorCode::DatabaseBusy, extended_code: 5 },
            None,
        );
        let mapped: GardenwiseError = InfraError::from(err).into();
        assert!(mapped.is_retryable());
    }

    #[test]
    fn malformed_statements_are_not_retryable() {
        for err in [
            SqlError::InvalidQuery,
            SqlError::InvalidColumnName("missing".into()),
            SqlError::InvalidParameterCount(1, 2),
        ] {
            let mapped: GardenwiseError = InfraError::from(err).into();
            assert!(matches!(mapped, GardenwiseError::Internal(_)), "got {mapped:?}");
            assert!(!mapped.is_retryable());
        }
    }

    #[test]
    fn missing_row_stays_a_storage_error() {
        let mapped: GardenwiseError = InfraError::from(SqlError::QueryReturnedNoRows).into();
        assert!(matches!(mapped, GardenwiseError::Database(msg) if msg.contains("no rows")));
    }

    #[tokio::test]
    async fn http_status_503_maps_to_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::SERVICE_UNAVAILABLE))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: GardenwiseError = InfraError::from(error).into();
        match mapped {
            GardenwiseError::Network(msg) => assert!(msg.contains("503")),
            other => panic!("expected network error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn http_status_400_maps_to_invalid_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::BAD_REQUEST))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: GardenwiseError = InfraError::from(error).into();
        assert!(matches!(mapped, GardenwiseError::InvalidRequest(_)));
    }
}
