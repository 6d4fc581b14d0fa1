use serde::{Deserialize, Serialize};

use crate::api::ApiError;
use crate::app::{JournalError, TradeAction};
use crate::journal::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Uk,
    En,
}

impl Locale {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "uk" | "ua" => Some(Locale::Uk),
            "en" => Some(Locale::En),
            _ => None,
        }
    }
}

/// Fixed UI strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    SigningIn,
    SignedIn,
    CreatingAccount,
    AccountCreated,
    CheckEmail,
    SignedOut,
    NoTrades,
    NotPublic,
    LoadFailed,
    TradeSaved,
    TradeDeleted,
    ConfirmDelete,
    ImportPrompt { count: usize },
    ImportDone,
    ImportFailed,
    ShareOn,
    ShareOff,
    ReadOnly,
    NotSignedIn,
    Busy,
    CacheUpdated,
}

pub fn text(locale: Locale, message: Message) -> String {
    use Message::*;
    let s = match (locale, message) {
        (Locale::Uk, SigningIn) => "Виконується вхід...",
        (Locale::En, SigningIn) => "Signing in...",
        (Locale::Uk, SignedIn) => "Успішний вхід!",
        (Locale::En, SignedIn) => "Signed in!",
        (Locale::Uk, CreatingAccount) => "Створення акаунта...",
        (Locale::En, CreatingAccount) => "Creating account...",
        (Locale::Uk, AccountCreated) => "Акаунт створено!",
        (Locale::En, AccountCreated) => "Account created!",
        (Locale::Uk, CheckEmail) => "Акаунт створено! Перевірте пошту для підтвердження.",
        (Locale::En, CheckEmail) => "Account created! Check your email to confirm it.",
        (Locale::Uk, SignedOut) => "Ви вийшли з акаунта",
        (Locale::En, SignedOut) => "Signed out",
        (Locale::Uk, NoTrades) => "Немає записів про трейди",
        (Locale::En, NoTrades) => "No trades yet",
        (Locale::Uk, NotPublic) => "Цей журнал не є публічним",
        (Locale::En, NotPublic) => "This journal is not public",
        (Locale::Uk, LoadFailed) => "Помилка завантаження даних",
        (Locale::En, LoadFailed) => "Failed to load data",
        (Locale::Uk, TradeSaved) => "Трейд збережено",
        (Locale::En, TradeSaved) => "Trade saved",
        (Locale::Uk, TradeDeleted) => "Трейд видалено",
        (Locale::En, TradeDeleted) => "Trade deleted",
        (Locale::Uk, ConfirmDelete) => "Видалити цей трейд?",
        (Locale::En, ConfirmDelete) => "Delete this trade?",
        (Locale::Uk, ImportPrompt { count }) => {
            return format!("Знайдено {} трейдів у локальному сховищі. Імпортувати їх?", count);
        }
        (Locale::En, ImportPrompt { count }) => {
            return format!("Found {} trades in local storage. Import them?", count);
        }
        (Locale::Uk, ImportDone) => "Дані успішно імпортовано!",
        (Locale::En, ImportDone) => "Data imported successfully!",
        (Locale::Uk, ImportFailed) => "Помилка при імпорті даних",
        (Locale::En, ImportFailed) => "Failed to import data",
        (Locale::Uk, ShareOn) => "Публічний доступ увімкнено",
        (Locale::En, ShareOn) => "Public access enabled",
        (Locale::Uk, ShareOff) => "Публічний доступ вимкнено",
        (Locale::En, ShareOff) => "Public access disabled",
        (Locale::Uk, ReadOnly) => "Журнал відкрито лише для перегляду",
        (Locale::En, ReadOnly) => "This journal is read-only",
        (Locale::Uk, NotSignedIn) => "Помилка: Немає активного користувача",
        (Locale::En, NotSignedIn) => "Error: no active user",
        (Locale::Uk, Busy) => "Попередній запит ще виконується",
        (Locale::En, Busy) => "A previous request is still running",
        (Locale::Uk, CacheUpdated) => "Доступна нова версія застосунку",
        (Locale::En, CacheUpdated) => "A new version is available",
    };
    s.to_string()
}

const UK_BACKEND_MESSAGES: &[(&str, &str)] = &[
    ("Invalid login credentials", "Невірний email або пароль"),
    ("Email not confirmed", "Email не підтверджено"),
    ("User already registered", "Користувач вже зареєстрований"),
    ("Password should be at least 6 characters", "Пароль має бути не менше 6 символів"),
    ("Unable to validate email address: invalid format", "Невірний формат email"),
    ("Failed to fetch", "Помилка мережі. Перевірте підключення до інтернету."),
];

/// Translate a backend message; unknown messages pass through verbatim
pub fn translate_error(locale: Locale, message: &str) -> String {
    match locale {
        Locale::Uk => UK_BACKEND_MESSAGES
            .iter()
            .find(|(en, _)| *en == message)
            .map(|(_, uk)| uk.to_string())
            .unwrap_or_else(|| message.to_string()),
        Locale::En if message == "Failed to fetch" => {
            "Network error. Check your internet connection.".to_string()
        }
        Locale::En => message.to_string(),
    }
}

fn validation(locale: Locale, error: &ValidationError) -> String {
    let uk = match error {
        ValidationError::MissingEmail => Some("Введіть email"),
        ValidationError::MissingPassword => Some("Введіть пароль"),
        ValidationError::PasswordTooShort => Some("Пароль має бути не менше 6 символів"),
        ValidationError::MissingDate => Some("Виберіть дату"),
        ValidationError::MissingRisk => Some("Введіть Risk %"),
        ValidationError::MissingResult => Some("Виберіть Result"),
        _ => None,
    };
    match (locale, uk) {
        (Locale::Uk, Some(s)) => s.to_string(),
        _ => error.to_string(),
    }
}

fn action_failed(locale: Locale, action: TradeAction) -> &'static str {
    match (locale, action) {
        (Locale::Uk, TradeAction::Add) => "Помилка при додаванні трейду",
        (Locale::En, TradeAction::Add) => "Failed to add trade",
        (Locale::Uk, TradeAction::Edit) => "Помилка при оновленні трейду",
        (Locale::En, TradeAction::Edit) => "Failed to update trade",
        (Locale::Uk, TradeAction::Delete) => "Помилка при видаленні трейду",
        (Locale::En, TradeAction::Delete) => "Failed to delete trade",
        (Locale::Uk, TradeAction::Share) => "Помилка при зміні налаштувань",
        (Locale::En, TradeAction::Share) => "Failed to change settings",
    }
}

fn backend_detail(locale: Locale, error: &ApiError) -> String {
    let mut detail = translate_error(locale, &error.user_message());
    if let Some(code) = error.code() {
        let label = match locale {
            Locale::Uk => "код",
            Locale::En => "code",
        };
        detail.push_str(&format!(" ({}: {})", label, code));
    }
    detail
}

/// User-facing text for any coordinator error
pub fn describe(locale: Locale, error: &JournalError) -> String {
    match error {
        JournalError::Validation(e) => validation(locale, e),
        JournalError::Api(e) => translate_error(locale, &e.user_message()),
        JournalError::Write { action, source } => {
            format!("{}: {}", action_failed(locale, *action), backend_detail(locale, source))
        }
        JournalError::Load(_) => text(locale, Message::LoadFailed),
        JournalError::Import(_) => text(locale, Message::ImportFailed),
        JournalError::ReadOnly => text(locale, Message::ReadOnly),
        JournalError::NotSignedIn => text(locale, Message::NotSignedIn),
        JournalError::Busy => text(locale, Message::Busy),
        JournalError::NotFound(_) | JournalError::Export(_) => error.to_string(),
    }
}
