use anyhow::{Context, Result, anyhow};
use chrono::Local;
use dotenv::dotenv;
use itertools::Itertools;
use regex::Regex;

use std::sync::LazyLock;

use learnboard::{
    config::Config,
    dashboard::{self, Dashboard},
    lbclient::{self, ProgressStore},
    models::UpdateAction,
    storage::LocalStorage,
    streak::StreakTracker,
};

static COMMAND_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{1,12}$").expect("command pattern is valid"));
const LEADERBOARD_SIZE: usize = 10;

struct CommandInstance<'a> {
    config: &'a Config,
    parameters: &'a [String],
}

impl CommandInstance<'_> {
    fn store(&self) -> Result<ProgressStore> {
        Ok(ProgressStore::new(&self.config.server_url, self.config.require_user_id()?))
    }

    /// Renders the dashboard from whatever the store currently holds,
    /// recording today's activity in the local streak first.
    fn render(&self, store: &ProgressStore) -> Result<String> {
        let progress = store
            .progress()
            .ok_or_else(|| anyhow!("{}", store.error().unwrap_or("No progress loaded.")))?;

        let tracker = StreakTracker::new(LocalStorage::open(&self.config.storage_dir)?);
        let today = Local::now().date_naive();
        let streak = tracker.observe(today, dashboard::active_on(progress, today))?;

        Ok(Dashboard::new(progress, &streak).to_string())
    }

    async fn dashboard(&self) -> Result<String> {
        let mut store = self.store()?;
        store.refresh_progress().await;
        self.render(&store)
    }

    async fn update(&self, action: UpdateAction) -> Result<String> {
        let item_id = self
            .parameters
            .first()
            .context("Expected an id, got none.")?;

        let points = self
            .parameters
            .get(1)
            .map(|p| p.parse::<u32>())
            .transpose()
            .context("Points must be a whole number.")?;

        let mut store = self.store()?;
        match action {
            UpdateAction::CompleteLesson => store.complete_lesson(item_id, points).await,
            UpdateAction::CompleteExercise => store.complete_exercise(item_id, points).await,
            UpdateAction::EarnAchievement => store.earn_achievement(item_id, points).await,
        };

        if let Some(error) = store.error() {
            return Err(anyhow!("{error}"));
        }

        self.render(&store)
    }

    async fn register(&self) -> Result<String> {
        let [name, email, password] = self.parameters else {
            return Err(anyhow!("Expected usage: `register <name> <email> <password>`"));
        };

        let registered = lbclient::register(&self.config.server_url, name, email, password).await?;
        Ok(format!(
            "{}\nYour user id is {}. Put LEARNBOARD_USER_ID={} in your .env file.",
            registered.message, registered.user.id, registered.user.id
        ))
    }

    async fn leaderboard(&self) -> Result<String> {
        let entries = lbclient::fetch_leaderboard(&self.config.server_url, LEADERBOARD_SIZE).await?;
        if entries.is_empty() {
            return Ok(String::from("Nobody is on the leaderboard yet."));
        }

        Ok(format!("**Leaderboard:**\n\t{}", entries.iter().join("\n\t")))
    }
}

async fn run_command(config: &Config, args: &[String]) -> Result<String> {
    let Some((command, parameters)) = args.split_first() else {
        return Ok(get_help());
    };

    let cmd = CommandInstance { config, parameters };

    let result = match command.as_str() {
        "dashboard" => cmd.dashboard().await?,
        "lesson" => cmd.update(UpdateAction::CompleteLesson).await?,
        "exercise" => cmd.update(UpdateAction::CompleteExercise).await?,
        "achieve" => cmd.update(UpdateAction::EarnAchievement).await?,
        "register" => cmd.register().await?,
        "leaderboard" => cmd.leaderboard().await?,
        "help" => get_help(),
        _ => {
            if is_valid_cmd(command) {
                log::info!("User submitted unknown command: {command}");
                return Err(anyhow!("No such command found: {command}, see `help` for commands."));
            } else {
                log::info!("User submitted invalid command: {command}");
                return Err(anyhow!("Invalid command syntax."));
            }
        }
    };

    Ok(result)
}

/// Ensures that the command is a short lowercase word
fn is_valid_cmd(s: &str) -> bool {
    COMMAND_NAME.is_match(s)
}

/// Gets a help string. Should be updated after a new command is added
fn get_help() -> String {
    String::from(
        r#"
**Command List:**
`dashboard`:  Show your level, streak and achievements.
`lesson <lesson id> [points]`:  Mark a lesson complete.
`exercise <exercise id> [points]`:  Mark an exercise complete.
`achieve <achievement id> [points]`:  Record an earned achievement.
`register <name> <email> <password>`:  Create an account.
`leaderboard`:  Show the top learners.
`help`:  Get information on supported commands
"#,
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    let args = std::env::args().skip(1).collect::<Vec<_>>();

    println!("{}", run_command(&config, &args).await?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            db_path: "unused.db".into(),
            bind: "127.0.0.1:0".parse().unwrap(),
            server_url: String::from("http://127.0.0.1:9"),
            storage_dir: ".learnboard-test".into(),
            user_id: None,
            award_once: false,
        }
    }

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn command_names_are_short_lowercase_words() {
        assert!(is_valid_cmd("help"));
        assert!(is_valid_cmd("leaderboard"));
        assert!(!is_valid_cmd("Help"));
        assert!(!is_valid_cmd("do-it"));
        assert!(!is_valid_cmd(""));
        assert!(!is_valid_cmd("muchtoolongname"));
    }

    #[tokio::test]
    async fn no_arguments_prints_help() {
        let help = run_command(&config(), &[]).await.unwrap();
        assert!(help.contains("**Command List:**"));
        assert_eq!(run_command(&config(), &args(&["help"])).await.unwrap(), help);
    }

    #[tokio::test]
    async fn unknown_and_invalid_commands_are_rejected() {
        let unknown = run_command(&config(), &args(&["frobnicate"])).await.unwrap_err();
        assert!(unknown.to_string().contains("No such command found: frobnicate"));

        let invalid = run_command(&config(), &args(&["Bad!"])).await.unwrap_err();
        assert_eq!(invalid.to_string(), "Invalid command syntax.");
    }

    #[tokio::test]
    async fn update_arguments_are_checked_before_any_request() {
        let missing = run_command(&config(), &args(&["lesson"])).await.unwrap_err();
        assert_eq!(missing.to_string(), "Expected an id, got none.");

        let not_a_number = run_command(&config(), &args(&["lesson", "x", "abc"])).await.unwrap_err();
        assert_eq!(not_a_number.to_string(), "Points must be a whole number.");

        let no_user = run_command(&config(), &args(&["exercise", "x", "5"])).await.unwrap_err();
        assert!(no_user.to_string().contains("LEARNBOARD_USER_ID"));
    }

    #[tokio::test]
    async fn register_needs_three_arguments() {
        let err = run_command(&config(), &args(&["register", "Ada", "ada@example.com"]))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Expected usage: `register"));
    }
}
