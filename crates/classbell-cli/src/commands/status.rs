use super::CliResult;

pub fn run(json: bool) -> CliResult {
    let mut bell = super::bell()?;
    // A one-shot read must not revert an override the running bell owns.
    bell.skip_startup();
    let snapshot = bell.tick(false).snapshot;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("{}", snapshot.lesson_name);
    println!(
        "{}: {} ({:.0}%)",
        snapshot.countdown_label, snapshot.countdown_text, snapshot.percent
    );
    if let (Some(part), Some(start)) = (&snapshot.part_id, snapshot.part_start) {
        println!("Period {part} from {}", start.format("%H:%M"));
    }
    println!("Next: {}", snapshot.next_lessons_text);
    if let Some(days) = snapshot.countdown_days {
        println!("Days left: {days}");
    }
    Ok(())
}
