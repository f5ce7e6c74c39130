use apigw_request::{parse_header_lines, ApiGatewayClient, RequestSpec, RetryOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::var("AWS_APIGW_URL")?;
    let region = std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_owned());

    let client = ApiGatewayClient::from_env().with_options(RetryOptions::default().with_max_retries(2));

    let spec = RequestSpec::new(url, region)
        .with_headers(parse_header_lines(Some(["x-test: my-value", "x-test-2: test"])));

    let res = client.request(&spec).await?;
    println!("{} {}", res.status_code, res.body);

    Ok(())
}
