use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use reqwest::Url;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const PUBLISHED: &str = r#"[
  {"title": "Fee schedule", "hipnum": 42, "category": "Core", "content": "network fees", "url": "https://hips.example.org/HIP/hip-42.html"},
  {"title": "Staking", "hipnum": "406", "category": "Service", "content": "rewards", "url": "https://hips.example.org/HIP/hip-406.html"}
]"#;

const DRAFTS: &str = r#"[
  {"number": 900, "title": "Fee rebates", "author": {"login": "alice"}, "url": "https://github.com/org/hips/pull/900",
   "headRefOid": "abc123", "files": {"edges": [{"node": {"path": "HIP/hip-900.md"}}]}},
  {"number": 901, "title": "Docs", "author": {"login": "bob"}, "url": "https://github.com/org/hips/pull/901",
   "headRefOid": "def456", "files": {"edges": [{"node": {"path": "README.md"}}]}}
]"#;

fn hips_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("hips");
    path
}

/// A built site on disk plus a config pointing at it.
fn setup_site(with_drafts: bool) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let site = root.join("site");
    fs::create_dir_all(site.join("_data")).unwrap();
    fs::write(site.join("search.json"), PUBLISHED).unwrap();
    if with_drafts {
        fs::write(site.join("_data").join("draft_hips.json"), DRAFTS).unwrap();
    }

    let page_url = Url::from_directory_path(&site).unwrap();
    let config = format!(
        r#"[sources]
page_url = "{}"
published_url = "./search.json"
timeout_secs = 5

[search]
limit = 5
no_results_text = "Nothing matched"
"#,
        page_url
    );
    let config_path = write_config(&root, &config);
    (tmp, config_path)
}

fn write_config(root: &Path, content: &str) -> PathBuf {
    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let config_path = config_dir.join("hips.toml");
    fs::write(&config_path, content).unwrap();
    config_path
}

fn run_hips(config_path: &Path, args: &[&str], env: &[(&str, &str)]) -> (String, String, bool) {
    let binary = hips_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .envs(env.iter().copied())
        .output()
        .unwrap_or_else(|e| panic!("Failed to run hips binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

async fn run_hips_async(config_path: PathBuf, args: Vec<String>, env: Vec<(String, String)>) -> (String, String, bool) {
    tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let env: Vec<(&str, &str)> = env.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        run_hips(&config_path, &args, &env)
    })
    .await
    .unwrap()
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

#[test]
fn test_search_ranks_published_and_drafts() {
    let (_tmp, config_path) = setup_site(true);

    let (stdout, stderr, success) = run_hips(&config_path, &["search", "fee", "--no-links"], &[]);
    assert!(success, "search failed: {}", stderr);

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2, "unexpected output: {}", stdout);
    assert_eq!(lines[0], "📄 HIP: HIP-42: Fee schedule");
    assert_eq!(lines[1], "📝 Draft HIP: HIP-900: Fee rebates");
}

#[test]
fn test_search_draft_keyword() {
    let (_tmp, config_path) = setup_site(true);

    let (stdout, _, success) = run_hips(&config_path, &["search", "draft", "--json"], &[]);
    assert!(success);

    let results: Value = serde_json::from_str(&stdout).unwrap();
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["status"], "draft");
    assert_eq!(results[0]["doc_number"], "900");
    assert_eq!(results[0]["author"], "alice");
}

#[test]
fn test_search_without_draft_feed() {
    let (_tmp, config_path) = setup_site(false);

    let (stdout, _, success) = run_hips(&config_path, &["search", "staking", "--no-links"], &[]);
    assert!(success);
    assert_eq!(stdout.trim(), "📄 HIP: HIP-406: Staking");
}

#[test]
fn test_search_no_results_and_limit() {
    let (_tmp, config_path) = setup_site(true);

    let (stdout, _, success) = run_hips(&config_path, &["search", "zzz"], &[]);
    assert!(success);
    assert_eq!(stdout.trim(), "Nothing matched");

    let (stdout, _, success) = run_hips(
        &config_path,
        &["search", "fee", "--limit", "1", "--no-links"],
        &[],
    );
    assert!(success);
    assert_eq!(stdout.lines().count(), 1);

    let (_, stderr, success) = run_hips(&config_path, &["search", "fee", "--limit", "0"], &[]);
    assert!(!success);
    assert!(stderr.contains("--limit"));
}

#[test]
fn test_missing_config_uses_defaults() {
    let tmp = TempDir::new().unwrap();
    let (stdout, _, success) = run_hips(
        &tmp.path().join("absent.toml"),
        &["status", "Last Call"],
        &[],
    );
    assert!(success);
    assert!(stdout.starts_with("📢"));
}

#[test]
fn test_status_unknown_and_listing() {
    let (_tmp, config_path) = setup_site(true);

    let (stdout, _, success) = run_hips(&config_path, &["status", "Bogus"], &[]);
    assert!(success);
    assert_eq!(stdout.trim(), "No information available for this status.");

    let (stdout, _, success) = run_hips(&config_path, &["status"], &[]);
    assert!(success);
    assert_eq!(stdout.lines().count(), 11);
}

#[test]
fn test_sources_reports_both_feeds() {
    let (_tmp, config_path) = setup_site(false);

    let (stdout, stderr, success) = run_hips(&config_path, &["sources"], &[]);
    assert!(success, "sources failed: {}", stderr);
    assert!(stdout.contains("published    OK"));
    assert!(stdout.contains("drafts       UNAVAILABLE"));
}

#[test]
fn test_invalid_config_fails() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config(tmp.path(), "[search]\nlimit = 0\n");
    let (_, stderr, success) = run_hips(&config_path, &["status"], &[]);
    assert!(!success);
    assert!(stderr.contains("search.limit"));
}

// ============ Remote services ============

async fn judge(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer test-token") {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"})));
    }
    let draft = body["data"]["draft_hip"].as_str().unwrap_or_default();
    let result = if draft.contains("status: Draft") {
        json!({"is_valid": true, "issues": []})
    } else {
        json!({"is_valid": false, "issues": [
            {"field": "status", "issue": "missing", "suggestion": "add 'status: Draft'"}
        ]})
    };
    (StatusCode::OK, Json(json!({ "result": result })))
}

fn validator_config(root: &Path, base: &str) -> PathBuf {
    write_config(
        root,
        &format!(
            "[validator]\nendpoint = \"{}/execute/\"\ntoken_env = \"HIPS_TEST_TOKEN\"\n",
            base
        ),
    )
}

#[tokio::test]
async fn test_validate_accepts_and_rejects() {
    let base = serve(Router::new().route("/execute/", post(judge))).await;
    let tmp = TempDir::new().unwrap();
    let config_path = validator_config(tmp.path(), &base);

    let good = tmp.path().join("good.md");
    fs::write(&good, "---\ntitle: Fees\nstatus: Draft\n---\n").unwrap();
    let bad = tmp.path().join("bad.md");
    fs::write(&bad, "---\ntitle: Fees\n---\n").unwrap();
    let env = vec![("HIPS_TEST_TOKEN".to_string(), "test-token".to_string())];

    let (stdout, stderr, success) = run_hips_async(
        config_path.clone(),
        vec!["validate".to_string(), good.display().to_string()],
        env.clone(),
    )
    .await;
    assert!(success, "validate failed: {}", stderr);
    assert!(stdout.contains("Great Success"));

    let (stdout, _, success) = run_hips_async(
        config_path.clone(),
        vec!["validate".to_string(), bad.display().to_string()],
        env,
    )
    .await;
    assert!(!success);
    assert!(stdout.contains("status: missing. Suggestion: add 'status: Draft'"));
}

#[tokio::test]
async fn test_validate_without_token_fails() {
    let base = serve(Router::new().route("/execute/", post(judge))).await;
    let tmp = TempDir::new().unwrap();
    let config_path = validator_config(tmp.path(), &base);
    let file = tmp.path().join("hip.md");
    fs::write(&file, "---\nstatus: Draft\n---\n").unwrap();

    let (_, stderr, success) = run_hips_async(
        config_path,
        vec!["validate".to_string(), file.display().to_string()],
        Vec::new(),
    )
    .await;
    assert!(!success);
    assert!(stderr.contains("HIPS_TEST_TOKEN"));
}

#[tokio::test]
async fn test_drafts_enriched_from_head_commit() {
    let router = Router::new()
        .route("/_data/draft_hips.json", get(|| async { DRAFTS }))
        .route(
            "/raw/abc123/HIP/hip-900.md",
            get(|| async {
                "---\ntitle: Fee rebates for small accounts\nauthor: Alice Doe <@alice>\ntype: Standards Track\ncategory: Core\nstatus: Draft\n---\n\nBody\n"
            }),
        );
    let base = serve(router).await;

    let tmp = TempDir::new().unwrap();
    let config_path = write_config(
        tmp.path(),
        &format!(
            "[sources]\npage_url = \"{}/\"\nraw_content_base = \"{}/raw\"\n",
            base, base
        ),
    );

    let (stdout, stderr, success) = run_hips_async(
        config_path.clone(),
        vec!["drafts".to_string(), "--json".to_string()],
        Vec::new(),
    )
    .await;
    assert!(success, "drafts failed: {}", stderr);

    let drafts: Value = serde_json::from_str(&stdout).unwrap();
    let drafts = drafts.as_array().unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0]["number"], 900);
    assert_eq!(drafts[0]["title"], "Fee rebates for small accounts");
    assert_eq!(drafts[0]["needs_council_approval"], true);
    assert_eq!(drafts[0]["authors"][0]["name"], "Alice Doe");

    let (stdout, _, success) =
        run_hips_async(config_path, vec!["drafts".to_string()], Vec::new()).await;
    assert!(success);
    assert!(stdout.contains("PR-900"));
    assert!(stdout.contains("Yes"));
}
