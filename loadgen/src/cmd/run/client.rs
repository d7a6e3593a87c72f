use std::time::Duration;

use rama::{
    Layer as _, Service as _,
    error::{BoxError, ErrorContext as _},
    http::{
        HeaderValue, Request, Response,
        client::EasyHttpWebClient,
        layer::{
            map_request_body::MapRequestBodyLayer,
            required_header::AddRequiredRequestHeadersLayer,
        },
    },
    layer::TimeoutLayer,
    rt::Executor,
    service::BoxService,
};

use crate::utils::env::network_service_identifier;

/// Create the client used by all virtual users.
///
/// Connections are pooled and shared between iterations.
/// There is deliberately no retry layer: every failure has to surface
/// as a failed iteration.
pub fn http_client(
    exec: Executor,
    timeout: Duration,
) -> Result<BoxService<Request, Response, BoxError>, BoxError> {
    let inner = EasyHttpWebClient::connector_builder()
        .with_default_transport_connector()
        .without_tls_proxy_support()
        .without_proxy_support()
        .with_tls_support_using_boringssl(None)
        .with_default_http_connector(exec)
        .try_with_default_connection_pool()
        .context("create connection pool for decision log client")?
        .build_client();

    let client = (
        TimeoutLayer::new(timeout),
        AddRequiredRequestHeadersLayer::new()
            .with_user_agent_header_value(HeaderValue::from_static(network_service_identifier())),
        MapRequestBodyLayer::new_boxed_streaming_body(),
    )
        .into_layer(inner);

    Ok(client.boxed())
}
