use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use shell_core::{
    ControllerDeps, FormData, Frame, HeadlessBrowser, HttpFetcher, MessageBody, Mode, Shell,
};
use tracing::info;
use url::{form_urlencoded, Url};

mod views;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, env = "TURBO_SERVER_URL", default_value = "http://127.0.0.1:8000")]
    server_url: String,
    /// Admin path to open.
    #[arg(long, default_value = "/admin/")]
    path: String,
    /// Submit `path` as a form with this field; repeatable.
    #[arg(long = "field", value_name = "NAME=VALUE", value_parser = parse_field)]
    fields: Vec<(String, String)>,
    /// Open `path` in a modal over the admin home.
    #[arg(long)]
    modal: bool,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    if name.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

fn print_messages(shell: &Shell) {
    for message in shell.frame_messages() {
        let text = match &message.body {
            MessageBody::Text(text) | MessageBody::Html(text) => text,
        };
        println!("  {:?}: {text}", message.level);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let origin = Url::parse(&args.server_url)
        .with_context(|| format!("invalid server url '{}'", args.server_url))?;
    let fetcher = HttpFetcher::new(&args.server_url)?;
    let host = Arc::new(HeadlessBrowser::new(origin, "/admin/"));
    let shell = Shell::new(ControllerDeps::new(Arc::new(fetcher), host.clone()));
    let views = Arc::new(views::terminal_views());

    {
        let views = Arc::clone(&views);
        shell.page().add_navigation_listener(move |frame: &Frame| {
            println!("{}", views.render(frame, Mode::Browser));
        });
    }

    let form: FormData = args.fields;
    if args.modal {
        shell.navigate("/admin/turbo-init/").await?;
        let modal = shell
            .open_modal(
                &args.path,
                Some(Box::new(|| println!("(modal closed)"))),
            )
            .await?;
        if let Some(frame) = shell.modal_frame() {
            println!("{}", views.render(&frame, Mode::Modal));
        }
        if !form.is_empty() {
            modal.submit_form(&args.path, &form).await?;
            if let Some(frame) = shell.modal_frame() {
                println!("{}", views.render(&frame, Mode::Modal));
            }
        }
    } else if form.is_empty() {
        let path: String = form_urlencoded::byte_serialize(args.path.as_bytes()).collect();
        shell
            .navigate(&format!("/admin/turbo-init/?path={path}"))
            .await?;
    } else {
        shell.submit_form(&args.path, &form).await?;
    }

    print_messages(&shell);
    for location in host.assigned_locations() {
        info!(%location, "server asked for a full page load");
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
