use crate::commands::{parse, Command, HELP};
use crate::widget::{UiEvent, WidgetHandle};
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

async fn say<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}

fn describe(event: &UiEvent) -> String {
    match event {
        UiEvent::Alert { message } => format!("ALERT: {message}"),
        UiEvent::Error { message } => format!("error: {message}"),
        other => match serde_json::to_string(other) {
            Ok(json) => format!("event: {json}"),
            Err(_) => format!("event: {other:?}"),
        },
    }
}

/// Текстовый фронтенд: читает команды из `input`, печатает виджет в `out`
/// при каждом изменении. По выходу виджет размонтируется.
pub async fn run<R, W>(mut handle: WidgetHandle, input: R, mut out: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut last = handle.view();
    say(&mut out, HELP).await?;
    say(&mut out, &last.to_string()).await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse(&line) {
                    Ok(None) => {}
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(Command::Help)) => say(&mut out, HELP).await?,
                    Ok(Some(Command::Show)) => say(&mut out, &handle.view().to_string()).await?,
                    Ok(Some(Command::Json)) => {
                        let json = serde_json::to_string_pretty(&handle.view())
                            .map_err(io::Error::other)?;
                        say(&mut out, &json).await?;
                    }
                    Ok(Some(Command::Action(action))) => {
                        if !handle.send(action) {
                            break;
                        }
                    }
                    Ok(Some(Command::CallTo(id))) => {
                        if !(handle.set_target(id) && handle.call()) {
                            break;
                        }
                    }
                    Err(e) => say(&mut out, &e.to_string()).await?,
                }
            }
            Some(event) = handle.events.recv() => say(&mut out, &describe(&event)).await?,
            changed = handle.view.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = handle.view();
                if view != last {
                    say(&mut out, &view.to_string()).await?;
                    last = view;
                }
            }
        }
    }

    handle.unmount();
    Ok(())
}
