//! Blogchat – Terminal-Einstiegspunkt
//!
//! Laedt die Konfiguration, startet eine Seiten-Sitzung und liest Befehle
//! zeilenweise von stdin. Zeilen ohne `/` werden als Chat-Nachricht gesendet.

use anyhow::Result;
use blogchat_chat::{ChatError, Projektion};
use blogchat_client::{BlogChatClient, BlogChatConfig};
use tokio::io::{AsyncBufReadExt, BufReader};

const HILFE: &str = "\
/name <Name>              Anzeigenamen festlegen
/oeffnen | /schliessen    Chatfenster oeffnen oder schliessen
/aelter                   aeltere Nachrichten laden
/antworten <Nr>           auf die Nachricht mit dieser Nummer antworten
/abbrechen                Antwort verwerfen
/kommentar <Beitrag> <Text>
/kommentare <Beitrag>
/ende";

#[tokio::main]
async fn main() -> Result<()> {
    let config_pfad = std::env::var("BLOGCHAT_CONFIG").unwrap_or_else(|_| "blogchat.toml".into());
    let ip = std::env::var("BLOGCHAT_IP").unwrap_or_else(|_| "127.0.0.1".into());

    // Standardwerte falls Datei fehlt
    let config = BlogChatConfig::laden(&config_pfad)?;
    let client = BlogChatClient::starten(config, &ip).await?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        "Blogchat-Terminal bereit"
    );
    println!("{HILFE}");

    let mut zeilen = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let zeile = tokio::select! {
            zeile = zeilen.next_line() => zeile?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(zeile) = zeile else { break };
        if zeile.trim() == "/ende" {
            break;
        }
        if let Err(e) = befehl(&client, zeile.trim()).await {
            println!("! {}", e.benutzer_meldung());
        }
        anzeigen(&client.chat.projektion());
    }

    client.beenden().await;
    Ok(())
}

async fn befehl(client: &BlogChatClient, zeile: &str) -> Result<(), ChatError> {
    let (kommando, rest) = zeile.split_once(' ').unwrap_or((zeile, ""));
    match kommando {
        "" => {}
        "/name" => {
            client.chat.identitaet_festlegen(rest).await?;
        }
        "/oeffnen" => {
            client.chat.open().await?;
        }
        "/schliessen" => client.chat.close(),
        "/aelter" => {
            let ergebnis = client.chat.load_older().await?;
            println!("= {ergebnis:?}");
        }
        "/antworten" => {
            let ziel = rest
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|nr| client.chat.projektion().anweisungen.into_iter().nth(nr))
                .ok_or_else(|| ChatError::UngueltigeEingabe(format!("Keine Nachricht '{rest}'")))?;
            client.chat.begin_reply(&ziel.nachricht);
        }
        "/abbrechen" => {
            client.chat.cancel_reply();
        }
        "/kommentar" => {
            let (beitrag, text) = rest.split_once(' ').unwrap_or((rest, ""));
            client.kommentare.posten(beitrag, text, None).await?;
        }
        "/kommentare" => {
            for ansicht in client.kommentare.kommentare_laden(rest.trim()).await? {
                println!(
                    "  {}: {}{}",
                    ansicht.kommentar.author_name,
                    ansicht.kommentar.body,
                    ansicht.foto_url.map(|u| format!(" [{u}]")).unwrap_or_default()
                );
            }
        }
        _ if kommando.starts_with('/') => {
            println!("{HILFE}");
        }
        _ => {
            client.chat.send(zeile).await?;
        }
    }
    Ok(())
}

fn anzeigen(projektion: &Projektion) {
    for (nr, anweisung) in projektion.anweisungen.iter().enumerate() {
        let n = &anweisung.nachricht;
        if let Some(zitat) = &n.reply_to {
            println!("      > {}: {}", zitat.author_name, zitat.body_snippet);
        }
        let markierung = if anweisung.ist_antwortziel { "*" } else { " " };
        println!(
            "{markierung}{nr:>4} {} {}: {}",
            n.created_at.format("%H:%M"),
            n.author_name,
            n.body
        );
    }
    if let Some(antwort) = &projektion.antwort {
        println!("  Antwort an {}: {}", antwort.author_name, antwort.body_snippet);
    }
}
