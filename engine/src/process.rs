use crate::uci::{parse_uci_message, UciError, UciMessage};
use crate::{EngineInfo, GoParams, Opponent, OpponentDescriptor, SearchOutcome, UciOptionKind};
use async_trait::async_trait;
use std::borrow::Cow;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::time::Instant;

const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const QUIT_GRACE: Duration = Duration::from_secs(1);

/// How to start an engine and what to configure on it.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub path: PathBuf,
    /// `setoption` pairs, sent in order after `uciok`.
    pub options: Vec<(String, String)>,
    /// Bound for every wait during the handshake and resync.
    pub handshake_timeout: Duration,
}

impl EngineConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: Vec::new(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

/// A UCI engine reached over a line-oriented pipe pair.
pub struct UciEngine {
    process: Option<Child>,
    writer: Box<dyn AsyncWrite + Send + Unpin>,
    lines: mpsc::Receiver<String>,
    descriptor: OpponentDescriptor,
    handshake_timeout: Duration,
    /// A `go` was sent whose `bestmove` has not been read yet.
    dirty: bool,
}

impl UciEngine {
    /// Spawn the engine process and run the UCI handshake.
    #[tracing::instrument(level = "info", skip(config), fields(path = %config.path.display()))]
    pub async fn spawn(config: EngineConfig) -> Result<Self, UciError> {
        tracing::debug!("Spawning engine process");
        let mut process = tokio::process::Command::new(&config.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| UciError::Spawn {
                path: config.path.display().to_string(),
                source,
            })?;

        let stdin = process.stdin.take().ok_or(UciError::NoStdin)?;
        let stdout = process.stdout.take().ok_or(UciError::NoStdout)?;

        let mut engine = Self::attach(Some(process), stdout, stdin, config.handshake_timeout);
        if let Err(e) = engine.initialize(&config.options).await {
            tracing::error!("Engine handshake failed: {}", e);
            engine.quit().await;
            return Err(e);
        }
        Ok(engine)
    }

    /// Run the handshake over an arbitrary reader/writer pair.
    pub async fn from_io<R, W>(
        reader: R,
        writer: W,
        options: &[(String, String)],
        handshake_timeout: Duration,
    ) -> Result<Self, UciError>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let mut engine = Self::attach(None, reader, writer, handshake_timeout);
        engine.initialize(options).await?;
        Ok(engine)
    }

    fn attach<R, W>(
        process: Option<Child>,
        reader: R,
        writer: W,
        handshake_timeout: Duration,
    ) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (line_tx, line_rx) = mpsc::channel::<String>(256);
        tokio::spawn(forward_lines(reader, line_tx));

        Self {
            process,
            writer: Box::new(writer),
            lines: line_rx,
            descriptor: OpponentDescriptor::default(),
            handshake_timeout,
            dirty: false,
        }
    }

    async fn initialize(&mut self, options: &[(String, String)]) -> Result<(), UciError> {
        self.send("uci").await?;
        let deadline = self.deadline();
        loop {
            let line = self.next_line(deadline, "uciok").await?;
            match parse_uci_message(&line) {
                Ok(UciMessage::UciOk) => break,
                Ok(UciMessage::Id { name, value }) => match name.as_str() {
                    "name" => self.descriptor.name = Some(value),
                    "author" => self.descriptor.author = Some(value),
                    _ => tracing::debug!("Ignoring id {}", name),
                },
                Ok(UciMessage::Option(option)) => self.descriptor.options.push(option),
                Ok(_) => {}
                Err(e) => tracing::debug!("Ignoring handshake line: {}", e),
            }
        }
        tracing::debug!(
            options = self.descriptor.options.len(),
            "Received uciok"
        );

        for (name, value) in options {
            self.set_option(name, value).await?;
        }

        self.wait_ready().await?;
        self.send("ucinewgame").await?;
        self.wait_ready().await?;

        tracing::info!(
            engine = self.descriptor.name.as_deref().unwrap_or("unknown"),
            "Engine initialized"
        );
        Ok(())
    }

    async fn set_option(&mut self, name: &str, value: &str) -> Result<(), UciError> {
        let advertised = self
            .descriptor
            .options
            .iter_mut()
            .find(|opt| opt.name.eq_ignore_ascii_case(name));

        let command = match advertised {
            Some(opt) if opt.kind == UciOptionKind::Button => {
                format!("setoption name {}", opt.name)
            }
            Some(opt) => {
                opt.value = Some(value.to_string());
                format!("setoption name {} value {}", opt.name, value)
            }
            None => {
                tracing::warn!("Engine does not advertise option {:?}; sending anyway", name);
                format!("setoption name {} value {}", name, value)
            }
        };
        tracing::info!("Setting option: {}", command);
        self.send(&command).await
    }

    async fn wait_ready(&mut self) -> Result<(), UciError> {
        self.send("isready").await?;
        let deadline = self.deadline();
        loop {
            let line = self.next_line(deadline, "readyok").await?;
            if matches!(parse_uci_message(&line), Ok(UciMessage::ReadyOk)) {
                return Ok(());
            }
        }
    }

    async fn ensure_idle(&mut self) -> Result<(), UciError> {
        if self.dirty {
            self.resync().await?;
        }
        Ok(())
    }

    async fn send(&mut self, command: &str) -> Result<(), UciError> {
        tracing::trace!("UCI >> {}", command);
        self.writer.write_all(command.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn next_line(&mut self, deadline: Instant, waiting_for: &str) -> Result<String, UciError> {
        match tokio::time::timeout_at(deadline, self.lines.recv()).await {
            Ok(Some(line)) => Ok(line),
            Ok(None) => Err(UciError::Closed),
            Err(_) => Err(UciError::Timeout(waiting_for.to_string())),
        }
    }

    fn deadline(&self) -> Instant {
        Instant::now() + self.handshake_timeout
    }
}

#[async_trait]
impl Opponent for UciEngine {
    fn descriptor(&self) -> &OpponentDescriptor {
        &self.descriptor
    }

    async fn new_game(&mut self) -> Result<(), UciError> {
        self.ensure_idle().await?;
        self.send("ucinewgame").await?;
        self.wait_ready().await
    }

    async fn set_position(&mut self, fen: &str, moves: &[String]) -> Result<(), UciError> {
        self.ensure_idle().await?;
        let mut command = format!("position fen {}", fen);
        if !moves.is_empty() {
            command.push_str(" moves ");
            command.push_str(&moves.join(" "));
        }
        tracing::debug!(moves = moves.len(), "Setting position");
        self.send(&command).await
    }

    async fn search(&mut self, params: &GoParams) -> Result<SearchOutcome, UciError> {
        self.ensure_idle().await?;
        self.dirty = true;
        self.send(&params.to_command()).await?;

        let mut info = EngineInfo::default();
        loop {
            let line = self.lines.recv().await.ok_or(UciError::Closed)?;
            match parse_uci_message(&line) {
                Ok(UciMessage::BestMove { mv, ponder }) => {
                    self.dirty = false;
                    tracing::debug!("Received bestmove: {:?}", mv);
                    return Ok(SearchOutcome {
                        best_move: mv,
                        ponder,
                        info,
                    });
                }
                Ok(UciMessage::Info(latest)) if latest.is_informative() => info = latest,
                Ok(_) => {}
                Err(UciError::InvalidMove(text)) => {
                    self.dirty = false;
                    return Err(UciError::Protocol(format!(
                        "bestmove is not coordinate notation: {}",
                        text
                    )));
                }
                Err(e) => tracing::trace!("Ignoring search line: {}", e),
            }
        }
    }

    /// Stop any search still running and wait until the engine has answered
    /// both its pending `bestmove` and a fresh `readyok`.
    async fn resync(&mut self) -> Result<(), UciError> {
        if !self.dirty {
            return Ok(());
        }
        tracing::warn!("Resynchronizing engine after an abandoned search");
        self.send("stop").await?;
        self.send("isready").await?;

        let deadline = self.deadline();
        let mut seen_bestmove = false;
        let mut seen_readyok = false;
        while !(seen_bestmove && seen_readyok) {
            let line = self.next_line(deadline, "resync").await?;
            match parse_uci_message(&line) {
                Ok(UciMessage::BestMove { .. }) | Err(UciError::InvalidMove(_)) => {
                    seen_bestmove = true
                }
                Ok(UciMessage::ReadyOk) => seen_readyok = true,
                _ => {}
            }
        }
        self.dirty = false;
        Ok(())
    }

    async fn quit(&mut self) {
        tracing::info!("Sending quit command to engine");
        if let Err(e) = self.send("quit").await {
            tracing::debug!("Engine input already closed: {}", e);
        }
        if let Some(mut process) = self.process.take() {
            let _ = tokio::time::timeout(QUIT_GRACE, process.wait()).await;
            let _ = process.kill().await;
        }
    }
}

async fn forward_lines<R>(reader: R, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => {
                tracing::warn!("Engine stdout EOF - engine closed");
                break;
            }
            Ok(_) => {
                // Engines may print Latin-1 in `info string`; keep the line.
                let line = String::from_utf8_lossy(&buf);
                if let Cow::Owned(_) = line {
                    tracing::debug!("Engine output is not valid UTF-8: {:?}", line);
                }
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                tracing::trace!("UCI << {}", trimmed);
                if tx.send(trimmed.to_string()).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::error!("Error reading from engine stdout: {}", e);
                break;
            }
        }
    }
    tracing::debug!("Output reader task exiting");
}
