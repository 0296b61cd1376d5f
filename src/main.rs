use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use calculadora_voz::calc::{CommandDispatcher, Outcome, SessionState, handle_transcript};
use calculadora_voz::config::file::{config_file_path, load_config_file_from};
use calculadora_voz::history::HistoryStore;
use calculadora_voz::shell::Shell;
use calculadora_voz::voice::{ConsoleSpeaker, LineListener, Listen};
use calculadora_voz::Config;

/// Calculadora por voz - resolves spoken Spanish arithmetic
#[derive(Parser)]
#[command(name = "calculadora", version, about)]
struct Cli {
    /// Run a single command and exit; with no text, listen once
    #[arg(long, value_name = "TEXTO", num_args = 0..)]
    comando: Option<Vec<String>>,

    /// Show configuration paths, run an engine self-test and one listen test
    #[arg(long)]
    diagnostico: bool,

    /// Show usage examples
    #[arg(long)]
    ayuda: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

const USAGE: &str = "\
Calculadora por voz

Uso:
  calculadora                     Modo interactivo (una frase por línea)
  calculadora --comando TEXTO...  Ejecuta un solo comando
  calculadora --comando           Escucha un solo comando
  calculadora --diagnostico       Comprueba configuración y motor
  calculadora --ayuda             Muestra esta ayuda

Ejemplos:
  cinco más tres                  suma
  veinte entre cuatro             división
  dos elevado a ocho              potencia
  raíz cuadrada de dieciséis      raíz cuadrada
  seno de treinta                 seno (grados)
  quince por ciento de cien       porcentaje
  veinte grados a fahrenheit      temperatura
  resultado más diez              usa el último resultado

Comandos: ayuda, historial, limpiar historial, último resultado, deshacer,
configuración, guardar configuración, estado, modo continuo, modo normal,
pausar, reanudar, modo verboso, velocidad más rápida, velocidad más lenta,
volumen más alto, volumen más bajo, salir";

/// Engine self-test cases: transcript and expected value
const SELF_TEST: &[(&str, f64)] = &[
    ("cinco más tres", 8.0),
    ("veinte entre cuatro", 5.0),
    ("raíz cuadrada de dieciséis", 4.0),
    ("factorial de cinco", 120.0),
];

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity; stdout carries the replies
    let filter = match cli.verbose {
        0 => "info,calculadora_voz=info",
        1 => "info,calculadora_voz=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.ayuda {
        println!("{USAGE}");
        return Ok(());
    }

    let config_path = config_file_path();
    let contents = config_path
        .as_deref()
        .map(load_config_file_from)
        .unwrap_or_default();
    let config = Config::from_file(contents.clone());
    tracing::debug!(?config, "loaded configuration");

    if cli.diagnostico {
        return diagnose(config).await;
    }

    let history = HistoryStore::new(config.history_path());
    let state = SessionState::with_history(history.load());
    let timeout = Duration::from_secs(config.recognition.timeout_secs);

    let mut shell = Shell::new(
        CommandDispatcher::with_state(config, state),
        ConsoleSpeaker::stdout(),
    )
    .with_history_store(history);
    if let Some(path) = config_path {
        shell = shell.with_config_file(path, contents);
    }

    if let Some(words) = cli.comando {
        let heard = if words.is_empty() {
            LineListener::stdin().listen(timeout).await
        } else {
            Ok(words.join(" "))
        };
        let outcome = shell.run_once(heard).await?;
        tracing::debug!(?outcome, "command handled");
        return Ok(());
    }

    shell.run(LineListener::stdin()).await?;
    Ok(())
}

/// Print configuration paths, self-test the engine and try one listen
async fn diagnose(mut config: Config) -> anyhow::Result<()> {
    println!("Diagnóstico de la calculadora por voz");
    println!("---");

    match config_file_path() {
        Some(path) => println!(
            "Configuración: {} ({})",
            path.display(),
            if path.exists() { "existe" } else { "por defecto" }
        ),
        None => println!("Configuración: sin directorio de configuración"),
    }
    println!("Historial:     {}", config.history_path().display());
    println!(
        "Voz:           velocidad {}, volumen {:.1}",
        config.speech.rate, config.speech.volume
    );
    println!(
        "Escucha:       {} ({} s)",
        config.recognition.language, config.recognition.timeout_secs
    );
    println!("Decimales:     {}", config.decimal_precision);
    println!("Palabras clave: {}", config.wake_words.join(", "));

    println!("\nMotor de cálculo:");
    let mut state = SessionState::new();
    let mut failures = 0;
    for (text, expected) in SELF_TEST {
        let outcome = handle_transcript(text, &mut state, &mut config);
        let ok = matches!(outcome, Outcome::Success { value, .. } if (value - expected).abs() < 1e-9);
        if !ok {
            failures += 1;
        }
        println!(
            "  [{}] {text} -> {}",
            if ok { "ok" } else { "FALLO" },
            outcome.spoken_reply()
        );
    }

    println!("\nPrueba de escucha: escribe una frase y pulsa Enter");
    let timeout = Duration::from_secs(config.recognition.timeout_secs);
    match LineListener::stdin().listen(timeout).await {
        Ok(transcript) => println!("  Escuchado: {transcript}"),
        Err(e) => println!("  Sin transcripción: {e}"),
    }

    println!("\n---");
    if failures > 0 {
        anyhow::bail!("{failures} self-test case(s) failed");
    }
    println!("Todo correcto");
    Ok(())
}
