use inquire::{InquireError, Text};
use weather_core::{ChatMessage, Orchestrator, Session};

/// What the user typed at the chat prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Empty,
    Quit,
    Clear,
    History,
    Message(&'a str),
}

impl<'a> Input<'a> {
    fn parse(line: &'a str) -> Self {
        match line.trim() {
            "" => Input::Empty,
            "/quit" | "/exit" => Input::Quit,
            "/clear" => Input::Clear,
            "/history" => Input::History,
            text => Input::Message(text),
        }
    }
}

pub async fn run(orchestrator: &Orchestrator, mut session: Session) -> anyhow::Result<()> {
    println!("Smart Weather Chatbot");
    println!("Ask me about weather in any city, or chat about anything else!");
    println!("Commands: /clear, /history, /quit\n");

    loop {
        let line = match Text::new("You:").prompt() {
            Ok(line) => line,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err.into()),
        };

        match Input::parse(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::Clear => {
                session.clear();
                println!("Chat history cleared.\n");
            }
            Input::History => print!("{}", transcript(session.history())),
            Input::Message(text) => {
                session.push_user(text);

                eprintln!("Thinking...");
                let reply = orchestrator.complete(&session.context()).await;

                println!("Assistant: {reply}\n");
                session.push_assistant(reply);
            }
        }
    }

    Ok(())
}

fn transcript(history: &[ChatMessage]) -> String {
    if history.is_empty() {
        return "(no messages yet)\n".to_string();
    }

    history
        .iter()
        .map(|msg| format!("[{}] {}\n", msg.role(), msg.content()))
        .collect()
}
