//! Find Color entry point
//!
//! Native builds run a terminal front end. The web build is driven from
//! JavaScript through `find_color::platform::web`.

#[cfg(not(target_arch = "wasm32"))]
mod terminal {
    use std::error::Error;
    use std::io::{self, BufRead, Write};
    use std::path::PathBuf;
    use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
    use std::time::Duration;

    use clap::{Parser, Subcommand};

    use find_color::platform::{Clock, clock_seed};
    use find_color::ranking::{self, FileStore, Identity};
    use find_color::settings::Settings;
    use find_color::sim::{Decision, GameEvent, GamePhase, GameSession, Navigation, Rgb};

    #[derive(Parser)]
    #[command(
        name = "find-color",
        version,
        about = "Spot the odd-colored tile before time runs out"
    )]
    pub struct Cli {
        #[command(subcommand)]
        command: Option<Command>,
        /// Settings file (JSON); defaults are used when it does not exist
        #[arg(long)]
        config: Option<PathBuf>,
        /// Ranking document (JSON)
        #[arg(long, default_value = "ranking.json")]
        ranking: PathBuf,
        /// Run seed (defaults to the clock)
        #[arg(long)]
        seed: Option<u64>,
        /// Signed-in player id; scores are only submitted with one
        #[arg(long)]
        user_id: Option<String>,
        /// Display name shown on the ranking screen
        #[arg(long)]
        name: Option<String>,
        /// Log at info level
        #[arg(short, long)]
        verbose: bool,
    }

    #[derive(Subcommand, Clone, Copy)]
    enum Command {
        /// Go straight to a game
        Play,
        /// Show the ranking and exit
        Rank,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Screen {
        Start,
        Game,
        Ranking,
        Quit,
    }

    impl From<Navigation> for Screen {
        fn from(to: Navigation) -> Self {
            match to {
                Navigation::StartScreen => Screen::Start,
                Navigation::Ranking => Screen::Ranking,
            }
        }
    }

    struct App {
        settings: Settings,
        seed: Option<u64>,
        identity: Option<Identity>,
        store: FileStore,
        lines: Receiver<String>,
    }

    pub fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
        let level = if cli.verbose { "info" } else { "warn" };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
        log::info!("Find Color (native) starting...");

        let settings = match &cli.config {
            Some(path) => Settings::load_from(path)?,
            None => Settings::default(),
        };
        let identity = cli
            .user_id
            .map(|id| Identity::new(id, cli.name.unwrap_or_default()));
        if identity.is_none() {
            log::info!("Playing anonymously, scores will not be submitted");
        }

        let app = App {
            settings,
            seed: cli.seed,
            identity,
            store: FileStore::new(cli.ranking),
            lines: spawn_stdin_reader(),
        };

        let mut screen = match cli.command {
            None => Screen::Start,
            Some(Command::Play) => Screen::Game,
            Some(Command::Rank) => {
                app.ranking_screen(false);
                return Ok(());
            }
        };

        loop {
            screen = match screen {
                Screen::Start => app.start_screen(),
                Screen::Game => app.play()?,
                Screen::Ranking => app.ranking_screen(true),
                Screen::Quit => break,
            };
        }
        Ok(())
    }

    /// Stdin lines arrive on a channel so the game loop can wait on input and
    /// timers at once. The channel closes at end of input.
    fn spawn_stdin_reader() -> Receiver<String> {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        rx
    }

    fn prompt(text: &str) {
        print!("{}", text);
        let _ = io::stdout().flush();
    }

    impl App {
        fn start_screen(&self) -> Screen {
            println!("\n=== Find Color ===");
            loop {
                prompt("[s] Start  [r] Rank  [q] Quit > ");
                let Ok(line) = self.lines.recv() else {
                    return Screen::Quit;
                };
                match line.trim() {
                    "s" | "start" => return Screen::Game,
                    "r" | "rank" => return Screen::Ranking,
                    "q" | "quit" => return Screen::Quit,
                    _ => {}
                }
            }
        }

        fn ranking_screen(&self, wait: bool) -> Screen {
            println!("\n=== Ranking ===");
            let lines = ranking::load_lines(&self.store);
            if lines.is_empty() {
                println!("(no entries)");
            }
            for line in lines {
                println!("{}", line);
            }
            if wait {
                prompt("Press Enter to go back > ");
                if self.lines.recv().is_err() {
                    return Screen::Quit;
                }
            }
            Screen::Start
        }

        fn play(&self) -> Result<Screen, Box<dyn Error>> {
            let seed = self.seed.unwrap_or_else(clock_seed);
            let mut session = GameSession::new(&self.settings, self.settings.canvas, seed)?;
            if let Some(identity) = &self.identity {
                session = session.with_identity(identity.clone());
            }
            let clock = Clock::start();

            loop {
                if let Some(next) = self.handle_events(&mut session) {
                    return Ok(next);
                }

                let input = match session.next_due_ms() {
                    Some(due) => {
                        let wait = due.saturating_sub(clock.elapsed_ms());
                        self.lines.recv_timeout(Duration::from_millis(wait))
                    }
                    None => self
                        .lines
                        .recv()
                        .map_err(|_| RecvTimeoutError::Disconnected),
                };
                session.advance_to(clock.elapsed_ms());

                match input {
                    Ok(line) => handle_line(&mut session, line.trim()),
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => return Ok(Screen::Quit),
                }
            }
        }

        /// Returns the next screen once the session asks to leave
        fn handle_events(&self, session: &mut GameSession) -> Option<Screen> {
            let mut next = None;
            for event in session.drain_events() {
                match event {
                    GameEvent::StageStarted { stage, .. } => {
                        println!("\n--- Stage {} ---", stage);
                        render_grid(session);
                        prompt("Tile number > ");
                    }
                    GameEvent::CountdownTick { remaining } => {
                        if remaining > 0 && (remaining <= 5 || remaining % 5 == 0) {
                            prompt(&format!("\n{}s left > ", remaining));
                        }
                    }
                    GameEvent::Message { text } => prompt(&format!("{} > ", text)),
                    GameEvent::Revealed { target } => {
                        println!("\nTime's up! The odd tile was {}.", target);
                        render_grid(session);
                    }
                    GameEvent::DecisionRequested => {
                        prompt("Game over. Play again? [y]es / [n]o > ");
                    }
                    GameEvent::SubmitScore { entry } => {
                        // Detached; the game never waits on the ranking store
                        drop(ranking::spawn_submission(self.store.clone(), entry));
                    }
                    GameEvent::Navigate { to } => next = Some(Screen::from(to)),
                }
            }
            next
        }
    }

    fn handle_line(session: &mut GameSession, line: &str) {
        match session.phase() {
            GamePhase::Playing => match parse_tile(line, session.grid().size()) {
                Some(index) => {
                    session.tap(index);
                }
                None => prompt("Enter a tile number or row,col > "),
            },
            GamePhase::AwaitingDecision => match line {
                "y" | "yes" | "r" | "retry" => {
                    session.choose(Decision::Retry);
                }
                "n" | "no" | "e" | "exit" => {
                    session.choose(Decision::Exit);
                }
                _ => prompt("[y]es / [n]o > "),
            },
            GamePhase::Revealing | GamePhase::Terminated => {}
        }
    }

    /// `"7"` or `"1,3"` (row, column)
    fn parse_tile(input: &str, grid_size: u32) -> Option<u32> {
        match input.split_once(',') {
            Some((row, col)) => {
                let row: u32 = row.trim().parse().ok()?;
                let col: u32 = col.trim().parse().ok()?;
                (row < grid_size && col < grid_size).then_some(row * grid_size + col)
            }
            None => input.parse().ok(),
        }
    }

    fn render_grid(session: &GameSession) {
        let grid = session.grid();
        let revealed = session.is_revealed();
        let width = grid.cell_count().saturating_sub(1).to_string().len() + 2;

        for row in 0..grid.size() {
            let mut line = String::new();
            for col in 0..grid.size() {
                let index = row * grid.size() + col;
                let Rgb { r, g, b } = grid.display_color(index, revealed).unwrap_or(Rgb::DIM);
                line.push_str(&format!(
                    "\x1b[30;48;2;{};{};{}m{:^width$}\x1b[0m ",
                    r,
                    g,
                    b,
                    index,
                    width = width
                ));
            }
            println!("{}", line);
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_parse_tile() {
            assert_eq!(parse_tile("7", 4), Some(7));
            assert_eq!(parse_tile("1,3", 4), Some(7));
            assert_eq!(parse_tile(" 2 , 0 ", 4), Some(8));
            assert_eq!(parse_tile("4,0", 4), None);
            assert_eq!(parse_tile("x", 4), None);
        }

        #[test]
        fn test_cli_parses() {
            let cli = Cli::try_parse_from([
                "find-color",
                "--user-id",
                "u1",
                "--name",
                "Mina",
                "--seed",
                "9",
                "play",
            ])
            .unwrap();
            assert!(matches!(cli.command, Some(Command::Play)));
            assert_eq!(cli.seed, Some(9));
            assert_eq!(cli.ranking, PathBuf::from("ranking.json"));
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use clap::Parser;

    let cli = terminal::Cli::parse();
    if let Err(e) = terminal::run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::wasm_main, this is just to satisfy the compiler
}
