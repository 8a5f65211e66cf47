use chatscrape_config::BrowserSettings;
use serde_json::{Map, Value, json};
use webdriver::capabilities::Capabilities;

/// Flags every scrape session starts with. Tuned for containers: no sandbox,
/// no shared-memory reliance, and no throttling of background renderers.
const BASE_ARGUMENTS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--disable-extensions",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-renderer-backgrounding",
    "--memory-pressure-off",
];

/// Construct Chrome command-line arguments for `settings`.
pub fn build_launch_arguments(settings: &BrowserSettings) -> Vec<String> {
    let mut args: Vec<String> = BASE_ARGUMENTS.iter().map(|a| a.to_string()).collect();
    if settings.headless {
        args.push("--headless=new".to_string());
    }
    args.push(format!("--user-agent={}", settings.user_agent));
    args.push(format!(
        "--window-size={},{}",
        settings.viewport.width, settings.viewport.height
    ));
    args.extend(settings.extra_args.iter().cloned());
    args
}

/// W3C session capabilities for a Chrome scrape session.
///
/// `pageLoadStrategy: eager` returns from navigation at DOMContentLoaded;
/// the page is then given a fixed settle period instead of waiting on every
/// subresource.
pub fn build_capabilities(settings: &BrowserSettings) -> Capabilities {
    let mut chrome_opts = Map::new();
    chrome_opts.insert("args".to_string(), json!(build_launch_arguments(settings)));
    if let Some(binary) = &settings.chrome_binary {
        chrome_opts.insert(
            "binary".to_string(),
            Value::String(binary.display().to_string()),
        );
    }

    let mut caps = Capabilities::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert("pageLoadStrategy".to_string(), json!("eager"));
    caps.insert("acceptInsecureCerts".to_string(), json!(true));
    caps.insert("goog:chromeOptions".to_string(), Value::Object(chrome_opts));
    caps
}
