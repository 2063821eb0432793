//! End-to-end tests for IpLookupService against mocked upstreams.

use ipscope_core::Config;
use ipscope_lookup::{IpLookupService, LookupError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Point every upstream at its own prefix on one mock server
fn config_for(server: &MockServer, api_key: Option<&str>) -> Config {
    let base = server.uri();
    let mut config = Config::default();
    config.endpoints.ipv4_echo = format!("{}/echo4", base);
    config.endpoints.ipv6_echo = format!("{}/echo6", base);
    config.endpoints.ipapi_co = format!("{}/ipapi-co", base);
    config.endpoints.ip_api_com = format!("{}/ip-api-com", base);
    config.endpoints.ipinfo = format!("{}/ipinfo", base);
    config.endpoints.ipwhois = format!("{}/ipwhois", base);
    config.endpoints.openweather = format!("{}/owm", base);
    config.weather.api_key = api_key.map(str::to_string);
    config.timeouts.geo_secs = 2;
    config.timeouts.whois_secs = 2;
    config.timeouts.ipv4_echo_secs = 2;
    config.timeouts.ipv6_echo_secs = 1;
    config.timeouts.weather_secs = 2;
    config
}

async fn mount_ip_api_com(server: &MockServer, ip: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/ip-api-com/json/{}", ip)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "country": "United States",
            "regionName": "California",
            "city": "Mountain View",
            "zip": "94043",
            "lat": 37.4223,
            "lon": -122.085,
            "timezone": "America/Los_Angeles",
            "isp": "Google LLC",
            "org": "Google Public DNS",
            "as": "AS15169 Google LLC",
            "hosting": true
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_whois(server: &MockServer, ip: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/ipwhois/{}", ip)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "type": "IPv4",
            "connection": {"asn": 15169, "org": "Google LLC", "isp": "Google LLC"}
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fallback_enrichment_and_weather() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ipapi-co/8.8.8.8/json/"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&server)
        .await;
    mount_ip_api_com(&server, "8.8.8.8").await;
    Mock::given(method("GET"))
        .and(path("/ipinfo/8.8.8.8/json"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    mount_whois(&server, "8.8.8.8").await;
    Mock::given(method("GET"))
        .and(path("/owm/weather"))
        .and(query_param("appid", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "main": {"temp": 18.5, "feels_like": 17.9, "humidity": 60},
            "weather": [{"main": "Clouds", "description": "broken clouds"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = IpLookupService::from_config(&config_for(&server, Some("test-key"))).unwrap();

    let record = service.lookup("8.8.8.8").await.unwrap();
    assert_eq!(record.city, "Mountain View");
    assert_eq!(record.country, "United States");
    assert_eq!(record.asn, "AS15169");
    assert_eq!(record.owner, "Google LLC");
    assert_eq!(record.ip_type, "IPv4");
    assert_eq!(record.connection_type, "Hosting");
    assert_eq!(record.postal, "940XXX");
    assert_eq!(record.weather.temperature, Some(18.5));
    assert_eq!(record.weather.condition.as_deref(), Some("Broken Clouds"));
    assert_ne!(record.local_time, "Unknown");
    assert!(!record.is_private_ip);

    // Second lookup: the rate-limited primary is asked again, everything
    // else comes from the cache
    let again = service.lookup("8.8.8.8").await.unwrap();
    assert_eq!(again.city, record.city);
    assert_eq!(again.weather, record.weather);
}

#[tokio::test]
async fn test_all_providers_down_yields_unknown_record() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let service = IpLookupService::from_config(&config_for(&server, Some("test-key"))).unwrap();

    let record = service.lookup("192.168.0.1").await.unwrap();
    assert_eq!(record.city, "Unknown");
    assert_eq!(record.owner, "Unknown");
    assert_eq!(record.latitude, None);
    assert_eq!(record.local_time, "Unknown");
    assert!(!record.weather.is_available());
    assert!(record.is_private_ip);
    assert_eq!(
        record.privacy_notice,
        "Private IP detected. Limited information available."
    );
}

#[tokio::test]
async fn test_invalid_ip_is_rejected() {
    let server = MockServer::start().await;
    let service = IpLookupService::from_config(&config_for(&server, None)).unwrap();

    let response = service.lookup_response("not-an-ip").await;
    assert!(response.is_error());
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        serde_json::json!({"error": "Invalid IP address format"})
    );
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_lookup_self_without_weather_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/echo4"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"ip": "203.0.113.7"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/echo6"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"ip": "2001:db8::7"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ipapi-co/203.0.113.7/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "city": "Null Island",
            "country_name": "Nowhere",
            "latitude": 0.0,
            "longitude": 0.0,
            "timezone": "UTC",
            "org": "Example Net"
        })))
        .mount(&server)
        .await;
    mount_whois(&server, "203.0.113.7").await;

    let service = IpLookupService::from_config(&config_for(&server, None)).unwrap();

    let record = service.lookup_self().await.unwrap();
    assert_eq!(record.ipv4, "203.0.113.7");
    assert_eq!(record.ipv6, "2001:db8::7");
    assert_eq!(record.latitude, Some(0.0));
    assert_eq!(record.longitude, Some(0.0));
    assert!(record.local_time.ends_with("UTC"));
    // No key: weather is the null block, local time is still reported
    assert!(!record.weather.is_available());
}

#[tokio::test]
async fn test_lookup_self_echo_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/echo4"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let service = IpLookupService::from_config(&config_for(&server, None)).unwrap();

    let err = service.lookup_self().await.unwrap_err();
    assert!(matches!(err, LookupError::SelfIp(_)));
    assert!(service.self_response().await.is_error());
}

#[tokio::test]
async fn test_lookup_self_rejects_non_address_echo() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/echo4"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"ip": "not-an-ip"})),
        )
        .expect(2)
        .mount(&server)
        .await;

    let service = IpLookupService::from_config(&config_for(&server, None)).unwrap();

    for _ in 0..2 {
        let err = service.lookup_self().await.unwrap_err();
        assert!(matches!(err, LookupError::SelfIp(_)));
    }
    assert!(service.cache().is_empty());
}
