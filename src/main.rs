use dotenv::dotenv;
use log::{error, info};
use teloxide::prelude::*;
use teloxide::types::{ChatAction, InputFile, ParseMode};
use teloxide::utils::command::BotCommands;

mod models;
mod render;
mod request;
mod utils;
mod weather;

use models::ModelId;
use request::ForecastRequest;
use weather::OpenMeteoClient;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
enum Command {
    #[command(description = "greeting and usage")]
    Start,
    #[command(description = "list supported forecast models")]
    Models,
    #[command(description = "compare hourly forecasts across models")]
    Forecast(String),
}

// Pre-escaped MarkdownV2.
const START_TEXT: &str = "🌤 *Welcome\\!*\n\n\
    I compare hourly temperature, precipitation and wind forecasts \
    across weather models\\.\n\n\
    *Usage:*\n\
    `/forecast <lat> <lon> <timezone> <YYYY-MM-DD> <start_hr> <end_hr> <models>`\n\n\
    *Example:*\n\
    `/forecast 22.26 69.40 Asia/Kolkata 2025-08-19 12 18 GFS,ICON`\n\n\
    See /models for the supported model list\\.";

#[tokio::main]
async fn main() {
    dotenv().ok();
    // Default to info-level logging when RUST_LOG is not set
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();
    info!("Starting meteomux...");

    let bot_token = std::env::var("BOT_TOKEN").expect("BOT_TOKEN is not set");
    let bot = Bot::new(bot_token);

    // Drop any stale webhook so getUpdates polling does not conflict
    if let Err(e) = bot.delete_webhook().await {
        error!("Failed to delete webhook: {}", e);
    }

    // Populate the command menu
    use teloxide::types::BotCommand;
    let commands = vec![
        BotCommand::new("start", "greeting and usage"),
        BotCommand::new("models", "list supported forecast models"),
        BotCommand::new("forecast", "compare hourly forecasts across models"),
    ];
    match bot.set_my_commands(commands).await {
        Ok(_) => info!("Command menu updated"),
        Err(e) => error!("Failed to set bot commands: {}", e),
    }

    let weather_client = OpenMeteoClient::new();

    let handler = Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_commands),
        )
        .branch(dptree::endpoint(handle_message));

    info!("Bot is ready");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![weather_client])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_commands(
    bot: Bot,
    msg: Message,
    cmd: Command,
    weather_client: OpenMeteoClient,
) -> ResponseResult<()> {
    let username = msg
        .from()
        .and_then(|user| user.username.clone())
        .unwrap_or_else(|| format!("ID: {}", msg.chat.id.0));

    match cmd {
        Command::Start => {
            info!("User @{} started the bot", username);
            bot.send_message(msg.chat.id, START_TEXT)
                .parse_mode(ParseMode::MarkdownV2)
                .await?;
        }
        Command::Models => {
            info!("User @{} requested the model list", username);
            let text = format!(
                "*Supported models:* {}",
                utils::escape_markdown_v2(&ModelId::supported_list())
            );
            bot.send_message(msg.chat.id, text)
                .parse_mode(ParseMode::MarkdownV2)
                .await?;
        }
        Command::Forecast(args) => {
            info!("User @{} requested a forecast: {}", username, args);
            send_forecast(&bot, &msg, &weather_client, &args, &username).await?;
        }
    }
    Ok(())
}

// Anything that is not a recognized command gets the usage pointer.
async fn handle_message(bot: Bot, msg: Message) -> ResponseResult<()> {
    if let Some(text) = msg.text() {
        let username = msg
            .from()
            .and_then(|user| user.username.clone())
            .unwrap_or_else(|| format!("ID: {}", msg.chat.id.0));
        info!("User @{} sent an unrecognized message: {}", username, text);

        bot.send_message(
            msg.chat.id,
            format!(
                "I only understand commands.\n{}\nSee /start for an example.",
                request::USAGE
            ),
        )
        .await?;
    }
    Ok(())
}

async fn send_forecast(
    bot: &Bot,
    msg: &Message,
    weather_client: &OpenMeteoClient,
    args: &str,
    username: &str,
) -> ResponseResult<()> {
    // Parse failures never reach the provider.
    let request = match ForecastRequest::parse(args) {
        Ok(request) => request,
        Err(e) => {
            info!("User @{} sent an invalid forecast request: {}", username, e);
            bot.send_message(msg.chat.id, format!("⚠️ {e}")).await?;
            return Ok(());
        }
    };

    bot.send_chat_action(msg.chat.id, ChatAction::Typing).await?;

    let table = match weather_client.fetch(&request).await {
        Ok(table) => table,
        Err(e) => {
            error!("Forecast fetch failed for @{}: {}", username, e);
            bot.send_message(
                msg.chat.id,
                format!("❌ Could not get the forecast: {e}\n\nPlease try again later."),
            )
            .await?;
            return Ok(());
        }
    };

    if table.is_empty() {
        info!("Empty forecast window for @{}", username);
        bot.send_message(
            msg.chat.id,
            format!(
                "No data for {} in hours {:02}-{:02}. \
                 The forecast horizon is about 16 days; check the date.",
                request.date, request.hour_from, request.hour_to
            ),
        )
        .await?;
        return Ok(());
    }

    let text = render::render_table(&table);
    if render::exceeds_message_limit(&text) {
        // Too wide for one message: attach the full data as CSV and show
        // the top of the table inline.
        let csv = render::to_csv(&table);
        let document = InputFile::memory(csv.into_bytes()).file_name("forecast.csv");
        bot.send_document(msg.chat.id, document)
            .caption("Forecast CSV")
            .await?;

        let snippet = render::snippet(&text);
        bot.send_message(
            msg.chat.id,
            format!("```\n{}\n```", utils::escape_code_fence(&snippet)),
        )
        .parse_mode(ParseMode::MarkdownV2)
        .await?;
    } else {
        bot.send_message(
            msg.chat.id,
            format!("```\n{}\n```", utils::escape_code_fence(&text)),
        )
        .parse_mode(ParseMode::MarkdownV2)
        .await?;
    }

    info!("Forecast delivered to @{}", username);
    Ok(())
}
