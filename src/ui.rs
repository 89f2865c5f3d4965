// UI layer: the interactive upload session, built on `dialoguer` prompts.
// Each step is a small function; failures that cannot be retried at the
// prompt bubble up as `anyhow` errors and end the session.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use dialoguer::{Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use tempfile::NamedTempFile;

use crate::api::{EsdrClient, FLAMINGO_PRODUCT_NAME};
use crate::config::Config;
use crate::convert::{first_line, stream_document, ConversionSummary};
use crate::feed::{is_yes, parse_latitude, parse_longitude, validate_feed_name, Feed, NewFeed};
use crate::record::serial_number_from_line;
use crate::temp_file::TempFileFactory;

const PLOT_PAGE: &str = "plot.html";

fn print_message(message: &str) {
    println!();
    println!("{}", message);
}

fn print_problem(message: &str) {
    println!();
    println!("{}", message.yellow());
}

fn spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Run the whole upload session: log in, pick the data file, find or
/// register the device, pick or create a feed, convert and upload.
pub fn run_session(mut api: EsdrClient, config: &Config) -> Result<()> {
    let product_id = api
        .product_id(FLAMINGO_PRODUCT_NAME)
        .context("Failed to read the Flamingo product ID from ESDR")?;

    println!("Welcome to the Flamingo Uploader!");

    let token = login(&api, config)?;
    api.set_token(&token);

    let data_file = prompt_data_file()?;

    let serial_number = read_serial_number(&data_file)?;
    print_message(&format!(
        "This data file is for device with serial number {}",
        serial_number
    ));

    let device_id = find_or_register_device(&api, product_id, &serial_number)?;

    let existing_feeds = api
        .feeds_for_device(device_id)
        .with_context(|| format!("Failed to read the feeds from ESDR for device [{}]", device_id))?;
    let feed = choose_feed(&api, device_id, &existing_feeds)?;

    print_message("Converting to JSON...");
    let mut temp_files = TempFileFactory::new("flamingo_import_", ".json");
    let temp_file = temp_files
        .create()
        .context("Failed to create the temp file required for converting the CSV to JSON")?;
    let summary = convert_file(&data_file, temp_file.path())?;
    info!("{}", summary.summary());

    print_message("Uploading...");
    let body = File::open(temp_file.path()).context("Failed to reopen the converted JSON")?;
    let pb = spinner("Uploading...");
    let uploaded = api.upload(&feed.api_key, body);
    pb.finish_and_clear();
    finish_upload(uploaded, temp_file)?;

    let plot_page = std::env::current_dir()
        .map(|dir| dir.join(PLOT_PAGE))
        .unwrap_or_else(|_| PathBuf::from(PLOT_PAGE));
    print_message("Upload successful! You can view the data by viewing this URL in your browser:");
    print_message(&feed.viewer_url(&plot_page));
    print_message("Bye!");
    Ok(())
}

/// Remove the upload body and report the upload outcome. A failed removal
/// is only logged so it cannot hide the upload result.
fn finish_upload(uploaded: crate::Result<()>, temp_file: NamedTempFile) -> Result<()> {
    let path = temp_file.path().to_path_buf();
    if let Err(e) = temp_file.close() {
        warn!("Failed to remove the temp file {}: {}", path.display(), e);
    }
    uploaded.context("Failed to upload")?;
    Ok(())
}

/// Keep asking for credentials until ESDR accepts them; returns the token.
fn login(api: &EsdrClient, config: &Config) -> Result<String> {
    let defaults = &config.default_user;
    loop {
        print_message("Please log in to ESDR:");

        let mut username_prompt = Input::<String>::new();
        username_prompt.with_prompt("   Username").allow_empty(true);
        if !defaults.username.is_empty() {
            username_prompt.default(defaults.username.clone());
        }
        let mut username = username_prompt.interact_text()?;

        let mut password = Password::new()
            .with_prompt(if defaults.password.is_empty() {
                "   Password"
            } else {
                "   Password [default]"
            })
            .allow_empty_password(true)
            .interact()?;

        if username.trim().is_empty() {
            username = defaults.username.clone();
        }
        if password.is_empty() {
            password = defaults.password.clone();
        }

        if username.trim().is_empty() || password.is_empty() {
            print_problem("Username and password cannot be empty, please try again...");
            continue;
        }

        let pb = spinner("Logging in...");
        let outcome = api.authenticate(username.trim(), &password);
        pb.finish_and_clear();

        match outcome.context("Authentication failed due to an unexpected error")? {
            Some(token) => {
                print_message("Successfully logged in to ESDR.");
                return Ok(token.access_token);
            }
            None => print_problem("Authentication failed, please try again..."),
        }
    }
}

/// Ask for the CSV path until it names a readable file.
fn prompt_data_file() -> Result<PathBuf> {
    loop {
        println!();
        let input: String = Input::new()
            .with_prompt("Enter the path to your Flamingo CSV data file")
            .allow_empty(true)
            .interact_text()?;
        let input = input.trim();
        if input.is_empty() {
            print_problem("The path cannot be empty.");
            continue;
        }

        let path = match std::env::current_dir() {
            Ok(dir) => dir.join(input),
            Err(_) => PathBuf::from(input),
        };
        match File::open(&path).and_then(|f| f.metadata()) {
            Ok(meta) if meta.is_file() => return Ok(path),
            Ok(_) => print_problem(&format!("Invalid path [{}]: not a file", path.display())),
            Err(e) => print_problem(&format!("Invalid path [{}]: {}", path.display(), e)),
        }
    }
}

fn read_serial_number(data_file: &Path) -> Result<String> {
    let file = File::open(data_file)
        .with_context(|| format!("Failed to open {}", data_file.display()))?;
    let line = first_line(BufReader::new(file)).context("Failed to read the first line")?;
    Ok(serial_number_from_line(&line)?)
}

fn find_or_register_device(api: &EsdrClient, product_id: i64, serial_number: &str) -> Result<i64> {
    let existing = api
        .find_device(serial_number)
        .context("Failed to read the devices from ESDR")?;
    match existing {
        Some(id) => {
            print_message("This device has already been registered under your ESDR account.");
            Ok(id)
        }
        None => {
            print_message(
                "This device has not yet been registered under your ESDR account, so we'll do so now...",
            );
            let id = api
                .register_device(product_id, serial_number)
                .context("Failed to create device in ESDR")?;
            print_message("Device created!");
            Ok(id)
        }
    }
}

/// Let the user pick an existing feed or create a new one.
fn choose_feed(api: &EsdrClient, device_id: i64, existing: &[Feed]) -> Result<Feed> {
    if existing.is_empty() {
        print_message("No feeds exist yet for this device, so we'll create one now...");
        return create_feed(api, device_id);
    }

    print_message("You have existing feeds for this device. Please choose the feed");
    println!("which should receive the upload, or create a new feed.");
    let mut items = vec!["Create a new feed".to_string()];
    items.extend(existing.iter().map(|f| f.name.clone()));

    let selection = Select::new()
        .with_prompt("Your selection")
        .items(&items)
        .default(1)
        .interact()?;
    match selection {
        0 => create_feed(api, device_id),
        n => Ok(existing[n - 1].clone()),
    }
}

fn create_feed(api: &EsdrClient, device_id: i64) -> Result<Feed> {
    loop {
        let feed = prompt_feed_details()?;
        print_message("The feed will be created with the following attributes:");
        println!("   Name:      {}", feed.name);
        println!("   Public?:   {}", feed.is_public);
        println!("   Latitude:  {}", feed.latitude);
        println!("   Longitude: {}", feed.longitude);

        if !ask_yes_no("Proceed? (Y/n)")? {
            print_message("Create feed aborted.  Please enter the details for the feed to be created...");
            continue;
        }

        let created = api
            .create_feed(device_id, &feed)
            .context("Failed to create feed")?;
        print_message("Successfully created the feed!");
        return Ok(created);
    }
}

fn prompt_feed_details() -> Result<NewFeed> {
    let name = ask_until("   Feed name", validate_feed_name, "Invalid feed name.  The name cannot be empty. Try again.")?;
    let is_public = ask_yes_no("   Is Public (Y/n)")?;
    let latitude = ask_until(
        "   Latitude",
        parse_latitude,
        "Invalid latitude. Latitude must be within the range [-90, 90]. Try again.",
    )?;
    let longitude = ask_until(
        "   Longitude",
        parse_longitude,
        "Invalid longitude. Longitude must be within the range [-180, 180]. Try again.",
    )?;
    Ok(NewFeed::new(name, is_public, latitude, longitude))
}

fn ask_until<T, F>(prompt: &str, parse: F, problem: &str) -> Result<T>
where
    F: Fn(&str) -> Option<T>,
{
    loop {
        let input: String = Input::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        match parse(&input) {
            Some(value) => return Ok(value),
            None => print_problem(problem),
        }
    }
}

fn ask_yes_no(prompt: &str) -> Result<bool> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    Ok(is_yes(&input))
}

/// Convert `data_file` into the upload document at `json_path`.
fn convert_file(data_file: &Path, json_path: &Path) -> Result<ConversionSummary> {
    let input = File::open(data_file)
        .with_context(|| format!("Failed to open {}", data_file.display()))?;
    let output = File::create(json_path)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;

    let pb = spinner("Converting...");
    let converted = stream_document(BufReader::new(input), BufWriter::new(output));
    pb.finish_and_clear();

    let (_, summary) = converted.context("Failed to convert the data file")?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn temp_body(dir: &Path) -> NamedTempFile {
        TempFileFactory::in_dir(dir, "flamingo_import_", ".json")
            .create()
            .unwrap()
    }

    #[test]
    fn test_finish_upload_removes_body() {
        let dir = tempfile::tempdir().unwrap();
        let body = temp_body(dir.path());
        let path = body.path().to_path_buf();

        finish_upload(Ok(()), body).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_upload_error_survives_failed_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let body = temp_body(dir.path());
        std::fs::remove_file(body.path()).unwrap();

        let uploaded = Err(Error::Api {
            status: reqwest::StatusCode::BAD_GATEWAY,
            body: "feed store offline".into(),
        });
        let err = finish_upload(uploaded, body).unwrap_err();

        let message = format!("{:#}", err);
        assert!(message.starts_with("Failed to upload"), "{message}");
        assert!(message.contains("feed store offline"), "{message}");
    }
}
