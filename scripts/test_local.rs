use std::time::Instant;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde_json::json;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let api_url = std::env::var("API_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:8000/api/voice-detection".to_string());
    let api_key = std::env::var("API_KEY").unwrap_or_else(|_| "sk_test_123456789".to_string());

    let mut args = std::env::args().skip(1);
    let audio_file = args.next().unwrap_or_else(|| "sample_voice.mp3".to_string());
    let language = args.next().unwrap_or_else(|| "English".to_string());

    println!("🎤 AI Voice Detection - Local Test");
    println!("{:=<50}", "");
    println!("\nTesting with: {audio_file}");

    let bytes = match std::fs::read(&audio_file) {
        Ok(bytes) => bytes,
        Err(_) => {
            println!("❌ File not found: {audio_file}");
            return;
        }
    };

    let audio_format = audio_file.rsplit('.').next().unwrap_or("mp3").to_lowercase();
    let audio_base64 = BASE64.encode(&bytes);
    println!("✅ File loaded, size: {} characters", audio_base64.len());

    println!("📡 Sending request to {api_url}...");
    let start = Instant::now();

    let response = Client::new()
        .post(&api_url)
        .header("x-api-key", &api_key)
        .json(&json!({
            "language": language,
            "audioFormat": audio_format,
            "audioBase64": audio_base64,
        }))
        .send()
        .await
        .expect("Request failed");

    let elapsed = start.elapsed().as_millis();
    let status = response.status();
    let result: serde_json::Value = response.json().await.expect("Parse failed");

    println!("\n📊 Response ({elapsed}ms):");
    println!("Status Code: {status}");

    if status.is_success() {
        println!("\n🎯 RESULT:");
        println!("   Status: {}", result["status"]);
        println!("   Language: {}", result["language"]);
        println!("   Classification: {}", result["classification"]);
        println!("   Confidence: {}", result["confidenceScore"]);
        println!("   Explanation: {}", result["explanation"]);
    } else {
        println!("❌ Error: {result}");
    }

    println!("\n{:=<50}", "");
    println!("✅ Test completed!");
    println!("{:=<50}", "");
}
