use actix_web::HttpRequest;

/// Rate-limit key used when no client address can be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Extract the client's address from the request, considering X-Forwarded-For if trusted.
/// Only the first (client-most) entry of the header is used.
pub fn get_client_ip(req: &HttpRequest, trust_x_forwarded_for: bool) -> String {
    if trust_x_forwarded_for {
        let forwarded = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty());

        if let Some(client) = forwarded {
            return client.to_string();
        }
    }
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn uses_first_forwarded_address() {
        let req = TestRequest::default()
            .insert_header(("x-forwarded-for", "203.0.113.7, 10.0.0.2"))
            .to_http_request();
        assert_eq!(get_client_ip(&req, true), "203.0.113.7");
    }

    #[test]
    fn ignores_forwarded_header_when_untrusted() {
        let req = TestRequest::default()
            .insert_header(("x-forwarded-for", "203.0.113.7"))
            .peer_addr("192.0.2.1:4000".parse().unwrap())
            .to_http_request();
        assert_eq!(get_client_ip(&req, false), "192.0.2.1");
    }

    #[test]
    fn falls_back_to_sentinel() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(get_client_ip(&req, true), UNKNOWN_CLIENT);
    }
}
