// SPDX-License-Identifier: GPL-3.0-only

//! Kiosk Keyboard scripted driver
//!
//! Runs the keyboard against an in-memory page and reads gestures from
//! stdin, one per line:
//!
//! ```text
//! click name       pointer-up on the element with id "name"
//! key q            tap the key labelled "q" in the shown table
//! double Shift     double-tap the key labelled "Shift"
//! show             print the page and keyboard state
//! quit
//! ```
//!
//! The optional first argument is a JSON config file.

use kiosk_keyboard::app_settings::FOCUS_STORAGE_KEY;
use kiosk_keyboard::config::Config;
use kiosk_keyboard::dom::{Document, MemoryDocument};
use kiosk_keyboard::focus::{FocusState, FocusStore, FocusTracker};
use kiosk_keyboard::keyboard::{Activation, VirtualKeyboard};
use kiosk_keyboard::layout::LayoutTables;
use kiosk_keyboard::page::PageListener;
use kiosk_keyboard::store::{FileStore, MemoryStore};
use std::error::Error;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(config.log_filter.parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let store: FocusStore = match &config.storage.path {
        Some(path) => {
            tracing::info!("Persisting focus state in {}", path.display());
            Arc::new(FileStore::new(
                path,
                FOCUS_STORAGE_KEY,
                FocusState::default(),
                config.storage.options,
            ))
        }
        None => Arc::new(MemoryStore::new(FocusState::default(), config.storage.options)),
    };

    let tracker = FocusTracker::new(store);
    let listener = PageListener::new(tracker.clone(), config.keyboard_root_id.clone());
    let mut keyboard = VirtualKeyboard::new(tracker.clone(), Arc::new(LayoutTables::load()?));
    let mut doc = demo_page(&config.keyboard_root_id)?;

    // Redraw hook: report every focus change the way the widget would re-render.
    let mut updates = tracker.subscribe();
    tokio::spawn(async move {
        use futures::StreamExt;
        while let Some(state) = updates.next().await {
            tracing::info!(
                "Keyboard {} (target: {:?})",
                if state.is_active { "shown" } else { "hidden" },
                state.active_element_id
            );
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, arg) = line.split_once(' ').unwrap_or((line, ""));

        let result = match command {
            "" => continue,
            "quit" => break,
            "click" => match doc.get_element_by_id(arg) {
                Some(node) => listener.on_pointer_up(&mut doc, node).await.map(|o| {
                    tracing::debug!("Pointer-up on '{}': {:?}", arg, o);
                }),
                None => {
                    println!("no element with id '{}'", arg);
                    Ok(())
                }
            },
            "key" | "double" => {
                let activation = if command == "double" {
                    Activation::Double
                } else {
                    Activation::Single
                };
                // A bare "key" presses the space bar.
                let label = if arg.is_empty() { "Space" } else { arg };
                keyboard
                    .press_label(&mut doc, label, activation)
                    .await
                    .map(|outcome| match outcome {
                        Some(outcome) => tracing::debug!("Key '{}': {:?}", label, outcome),
                        None => println!("no key '{}' in {:?}", label, keyboard.layout_state().variant()),
                    })
            }
            "show" => {
                print_state(&doc, &keyboard).await;
                Ok(())
            }
            other => {
                println!("unknown command '{}'", other);
                Ok(())
            }
        };

        if let Err(e) = result {
            tracing::error!("Gesture failed: {}", e);
        }
    }

    Ok(())
}

/// Builds a page with a text input, an email input, a text area and the
/// keyboard root.
fn demo_page(root_id: &str) -> Result<MemoryDocument, Box<dyn Error>> {
    let mut doc = MemoryDocument::new();
    let form = doc.append_element(doc.body(), "form")?;
    for (id, input_type) in [("name", "text"), ("email", "email")] {
        let input = doc.append_input(form, input_type)?;
        doc.set_element_id(input, id)?;
    }
    let notes = doc.append_element(form, "textarea")?;
    doc.set_element_id(notes, "notes")?;
    let heading = doc.append_element(doc.body(), "h1")?;
    doc.set_element_id(heading, "title")?;
    let root = doc.append_element(doc.body(), "div")?;
    doc.set_element_id(root, root_id)?;
    Ok(doc)
}

async fn print_state(doc: &MemoryDocument, keyboard: &VirtualKeyboard) {
    for id in ["name", "email", "notes"] {
        if let Some(node) = doc.get_element_by_id(id) {
            let value = doc.value(node).unwrap_or_default();
            let selection = doc.control(node).map(|c| c.selection()).unwrap_or_default();
            println!("{:>6}: {:?} caret {:?}", id, value, selection);
        }
    }

    match keyboard.is_visible().await {
        Ok(true) => {
            println!("keyboard: {:?}", keyboard.layout_state().variant());
            for row in &keyboard.current_layout().rows {
                let labels: Vec<&str> = row.iter().map(|k| k.label.as_str()).collect();
                println!("  {}", labels.join(" "));
            }
        }
        Ok(false) => println!("keyboard: hidden"),
        Err(e) => tracing::error!("Cannot read focus state: {}", e),
    }
}
