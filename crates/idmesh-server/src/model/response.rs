//! HTTP response helpers
//!
//! Every route answers with the `{code, message, data}` envelope from `idmesh_api::remote`.

use actix_web::{HttpResponse, HttpResponseBuilder, http::StatusCode};
use serde::Serialize;

use idmesh_api::remote::Result;

pub fn http_success(data: impl Serialize) -> HttpResponse {
    HttpResponse::Ok().json(Result::success(data))
}

pub fn http_response(status: u16, code: i32, message: String, data: impl Serialize) -> HttpResponse {
    HttpResponseBuilder::new(StatusCode::from_u16(status).unwrap_or_default())
        .json(Result::new(code, message, data))
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;

    use super::*;

    #[actix_rt::test]
    async fn test_http_success_envelope() {
        let response = http_success(true);
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["code"], 0);
        assert_eq!(value["message"], "success");
        assert_eq!(value["data"], true);
    }

    #[test]
    fn test_http_response_status() {
        let response = http_response(409, 20005, "exists".to_string(), String::new());
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = http_response(1, 1, String::new(), ());
        assert_eq!(response.status(), StatusCode::OK);
    }
}
