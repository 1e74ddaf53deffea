use reqwest::Client;
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = Client::new();
    let base_url = std::env::var("TUTOR_API").unwrap_or_else(|_| "http://127.0.0.1:3000".to_string());
    let pdf_path = std::env::args().nth(1);

    println!("🔍 Testing tutor API client");

    println!("\n📋 New session:");
    let session: serde_json::Value = client
        .post(format!("{}/sessions", base_url))
        .json(&json!({ "language": "English" }))
        .send()
        .await?
        .json()
        .await?;
    println!("Response: {}", serde_json::to_string_pretty(&session)?);
    let id = session["id"].as_str().ok_or("no session id")?.to_string();

    if let Some(path) = pdf_path {
        println!("\n📚 Uploading {}:", path);
        let bytes = std::fs::read(&path)?;
        let upload = client
            .post(format!("{}/sessions/{}/document", base_url, id))
            .header("Content-Type", "application/pdf")
            .body(bytes)
            .send()
            .await?;
        println!("Status: {}", upload.status());
        let upload_json: serde_json::Value = upload.json().await?;
        println!("Response: {}", serde_json::to_string_pretty(&upload_json)?);
    }

    for question in ["What is this chapter about?", "Give one worked example."] {
        println!("\n🔍 Ask: {}", question);
        let response = client
            .post(format!("{}/sessions/{}/ask", base_url, id))
            .json(&json!({ "question": question }))
            .send()
            .await?;
        println!("Status: {}", response.status());
        let answer: serde_json::Value = response.json().await?;
        println!("Response: {}", serde_json::to_string_pretty(&answer)?);
    }

    println!("\n♻️  Reset:");
    let reset = client
        .delete(format!("{}/sessions/{}", base_url, id))
        .send()
        .await?;
    println!("Status: {}", reset.status());

    println!("\n✅ Client test completed!");
    Ok(())
}
