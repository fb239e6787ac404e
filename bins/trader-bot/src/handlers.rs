use std::time::Duration;

use telegram::models::{
    CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, Message, Update,
};
use tracing::{debug, info, warn};
use trade_engine::account::portfolio_valuation;
use trade_engine::format;
use trade_engine::market::price_lookup;
use trade_engine::trade::{
    cancel_trade, confirm_callback_data, confirm_trade, parse_callback_data, prepare_trade,
    CallbackAction, TradeProposal, CANCEL_CALLBACK_DATA,
};
use trade_engine::{CommandError, OrderSide};

use crate::BotState;

/// Pause between successive /reset deletions, keeping under Telegram's
/// per-chat request limit.
const RESET_PACING: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Help,
    Balance,
    Buy,
    Sell,
    Info,
    Reset,
}

/// Parse "/buy@SomeBot 100 btcusdt" into a command and its arguments.
/// Anything that is not one of our commands, including commands addressed
/// to another bot, comes back as None.
fn parse_command<'a>(text: &'a str, bot_username: &str) -> Option<(Command, Vec<&'a str>)> {
    let mut parts = text.split_whitespace();
    let head = parts.next()?;
    let name = head.strip_prefix('/')?;

    let name = match name.split_once('@') {
        Some((name, target)) => {
            if !bot_username.is_empty() && !target.eq_ignore_ascii_case(bot_username) {
                return None;
            }
            name
        }
        None => name,
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "start" | "help" => Command::Help,
        "balance" => Command::Balance,
        "buy" => Command::Buy,
        "sell" => Command::Sell,
        "info" => Command::Info,
        "reset" => Command::Reset,
        _ => return None,
    };

    Some((command, parts.collect()))
}

pub async fn handle_update(state: BotState, update: Update) {
    if let Some(message) = update.message {
        handle_message(&state, message).await;
    } else if let Some(callback) = update.callback_query {
        handle_callback(&state, callback).await;
    }
}

async fn handle_message(state: &BotState, message: Message) {
    let chat_id = message.chat.id;
    state.history.record(chat_id, message.message_id).await;

    let Some(text) = message.text.as_deref() else {
        return;
    };
    let Some(user) = message.from.as_ref() else {
        return;
    };

    let Some((command, args)) = parse_command(text, &state.bot_username) else {
        debug!(chat_id, "ignoring message without a known command");
        return;
    };

    info!(chat_id, user_id = user.id, ?command, "handling command");
    match command {
        Command::Help => send(state, chat_id, format::help_text(), None).await,
        Command::Balance => match portfolio_valuation(state.exchange.as_ref()).await {
            Ok(view) => send(state, chat_id, &format::portfolio_message(&view), None).await,
            Err(err) => report_error(state, chat_id, user.id, &err).await,
        },
        Command::Buy => handle_trade(state, chat_id, user.id, OrderSide::Buy, &args).await,
        Command::Sell => handle_trade(state, chat_id, user.id, OrderSide::Sell, &args).await,
        Command::Info => match price_lookup(state.exchange.as_ref(), &args).await {
            Ok(quote) => send(state, chat_id, &format::price_message(&quote), None).await,
            Err(err) => report_error(state, chat_id, user.id, &err).await,
        },
        Command::Reset => handle_reset(state, chat_id).await,
    }
}

async fn handle_trade(
    state: &BotState,
    chat_id: i64,
    user_id: i64,
    side: OrderSide,
    args: &[&str],
) {
    match prepare_trade(state.exchange.as_ref(), &state.orders, user_id, side, args).await {
        Ok(proposal) => {
            let keyboard = confirmation_keyboard(&proposal);
            let text = format::trade_prompt(&proposal);
            send(state, chat_id, &text, Some(keyboard)).await;
        }
        Err(err) => report_error(state, chat_id, user_id, &err).await,
    }
}

fn confirmation_keyboard(proposal: &TradeProposal) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![
            vec![InlineKeyboardButton::callback(
                format::confirm_button_label(proposal.side),
                confirm_callback_data(&proposal.symbol),
            )],
            vec![InlineKeyboardButton::callback(
                format::cancel_button_label(),
                CANCEL_CALLBACK_DATA,
            )],
        ],
    }
}

async fn handle_callback(state: &BotState, callback: CallbackQuery) {
    // Always acknowledged, otherwise the client keeps its spinner.
    if let Err(err) = state.telegram.answer_callback_query(&callback.id).await {
        warn!(%err, "answerCallbackQuery failed");
    }

    let user_id = callback.from.id;
    let Some(message) = callback.message else {
        warn!(user_id, "callback without an attached message");
        return;
    };
    let chat_id = message.chat.id;
    let message_id = message.message_id;

    let Some(data) = callback.data.as_deref() else {
        debug!(user_id, "callback without data");
        return;
    };

    match parse_callback_data(data) {
        CallbackAction::Confirm { symbol } => {
            edit(state, chat_id, message_id, format::processing_message()).await;
            let outcome =
                confirm_trade(state.exchange.as_ref(), &state.orders, user_id, &symbol).await;
            let text = match &outcome {
                Ok(receipt) => format::execution_message(receipt),
                Err(err) => {
                    warn!(user_id, %symbol, %err, "trade confirmation failed");
                    format::describe_error(err)
                }
            };
            edit(state, chat_id, message_id, &text).await;
        }
        CallbackAction::Cancel => {
            cancel_trade(&state.orders, user_id).await;
            edit(state, chat_id, message_id, format::cancellation_message()).await;
        }
        CallbackAction::Unknown => {
            debug!(user_id, data, "ignoring unknown callback payload");
        }
    }
}

async fn handle_reset(state: &BotState, chat_id: i64) {
    let tracked = state.history.drain(chat_id).await;
    info!(chat_id, count = tracked.len(), "resetting conversation");

    for message_id in tracked {
        // Already-deleted or too-old messages are skipped, not fatal.
        if let Err(err) = state.telegram.delete_message(chat_id, message_id).await {
            debug!(chat_id, message_id, %err, "delete failed, skipping");
        }
        tokio::time::sleep(RESET_PACING).await;
    }

    send(state, chat_id, format::help_text(), None).await;
}

async fn send(state: &BotState, chat_id: i64, text: &str, keyboard: Option<InlineKeyboardMarkup>) {
    match state.telegram.send_message(chat_id, text, keyboard).await {
        Ok(sent) => state.history.record(chat_id, sent.message_id).await,
        Err(err) => warn!(chat_id, %err, "sendMessage failed"),
    }
}

async fn edit(state: &BotState, chat_id: i64, message_id: i64, text: &str) {
    if let Err(err) = state
        .telegram
        .edit_message_text(chat_id, message_id, text)
        .await
    {
        warn!(chat_id, message_id, %err, "editMessageText failed");
    }
}

async fn report_error(state: &BotState, chat_id: i64, user_id: i64, err: &CommandError) {
    warn!(chat_id, user_id, %err, "command failed");
    send(state, chat_id, &format::describe_error(err), None).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn commands_parse_case_insensitively_with_arguments() {
        let (command, args) = parse_command("/BUY 100 btcusdt", "").unwrap();
        assert_eq!(command, Command::Buy);
        assert_eq!(args, vec!["100", "btcusdt"]);

        let (command, args) = parse_command("/balance", "").unwrap();
        assert_eq!(command, Command::Balance);
        assert!(args.is_empty());
    }

    #[test]
    fn start_is_an_alias_for_help() {
        assert_eq!(parse_command("/start", "").unwrap().0, Command::Help);
        assert_eq!(parse_command("/help", "").unwrap().0, Command::Help);
    }

    #[test]
    fn bot_suffix_is_stripped_when_it_matches() {
        let (command, args) = parse_command("/sell@TraderBot 0.5 ethusdt", "TraderBot").unwrap();
        assert_eq!(command, Command::Sell);
        assert_eq!(args, vec!["0.5", "ethusdt"]);

        assert!(parse_command("/sell@OtherBot 0.5 ethusdt", "TraderBot").is_none());
    }

    #[test]
    fn non_commands_and_unknown_commands_are_ignored() {
        assert!(parse_command("hello there", "").is_none());
        assert!(parse_command("/unknown", "").is_none());
        assert!(parse_command("", "").is_none());
    }

    #[test]
    fn extra_whitespace_is_tolerated() {
        let (command, args) = parse_command("  /info   BTCUSDT  ", "").unwrap();
        assert_eq!(command, Command::Info);
        assert_eq!(args, vec!["BTCUSDT"]);
    }

    #[test]
    fn confirmation_buttons_stack_in_two_rows() {
        let proposal = TradeProposal {
            symbol: "BTCUSDT".to_string(),
            side: OrderSide::Buy,
            quantity: dec!(0.002),
            price: dec!(50000),
            estimated_total: dec!(100),
        };

        let keyboard = confirmation_keyboard(&proposal);

        let [confirm_row, cancel_row] = keyboard.inline_keyboard.as_slice() else {
            panic!("expected two keyboard rows, got {:?}", keyboard);
        };
        assert_eq!(confirm_row.len(), 1);
        assert_eq!(
            confirm_row[0].callback_data.as_deref(),
            Some("confirm_BTCUSDT")
        );
        assert_eq!(cancel_row.len(), 1);
        assert_eq!(
            cancel_row[0].callback_data.as_deref(),
            Some(CANCEL_CALLBACK_DATA)
        );
    }
}
