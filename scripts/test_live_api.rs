use reqwest::Client;
use serde_json::json;

#[tokio::main]
async fn main() {
    println!("Starting tests...");

    let base_url =
        std::env::var("API_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string());
    let client = Client::new();

    println!("{:=<50}", "");
    println!("Test 1: Health Check");
    println!("{:=<50}", "");

    match client.get(&base_url).send().await {
        Ok(response) => {
            println!("Status Code: {}", response.status());
            match response.json::<serde_json::Value>().await {
                Ok(body) => println!("Response: {body}"),
                Err(e) => println!("Error: {e}"),
            }
        }
        Err(e) => println!("Error: {e}"),
    }

    println!("\n{:=<50}", "");
    println!("Test 2: API with Key");
    println!("{:=<50}", "");

    // Deliberately undersized payload; the API should answer with a clean
    // validation error rather than a 500.
    let result = client
        .post(format!("{base_url}/api/voice-detection"))
        .header("x-api-key", "sk_test_123456789")
        .json(&json!({
            "language": "English",
            "audioFormat": "mp3",
            "audioBase64": "dGVzdGluZw==",
        }))
        .send()
        .await;

    match result {
        Ok(response) => {
            println!("Status Code: {}", response.status());
            match response.json::<serde_json::Value>().await {
                Ok(body) => println!("Response: {body}"),
                Err(e) => println!("Error: {e}"),
            }
        }
        Err(e) => println!("Error: {e}"),
    }

    println!("\n{:=<50}", "");
    println!("Tests completed!");
    println!("{:=<50}", "");
}
