//! Terminal output formatting.

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};

use dnivault_core::storage::{AuditEvent, RecordSummary, StoredRecord};

pub fn print_record(record: &StoredRecord) {
    println!("Record      {}", record.id);
    println!("DNI         {}", record.dni);
    println!("Names       {}", record.identity.given_names);
    println!("Surnames    {} {}", record.identity.paternal_surname, record.identity.maternal_surname);
    println!("Full name   {}", record.identity.full_name);
    println!("Created     {}", record.created_at.to_rfc3339());
    println!("Updated     {}", record.updated_at.to_rfc3339());
}

pub fn print_history(records: &[RecordSummary]) {
    if records.is_empty() {
        println!("No records.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "DNI", "Full name", "Created"]);

    for record in records {
        table.add_row(vec![
            Cell::new(record.id),
            Cell::new(&record.dni),
            Cell::new(&record.full_name),
            Cell::new(record.created_at.format("%Y-%m-%d %H:%M:%S")),
        ]);
    }

    println!("{table}");
}

pub fn print_audit_events(events: &[AuditEvent]) {
    if events.is_empty() {
        println!("No audit events.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["When", "Action", "DNI", "Source IP", "User agent"]);

    for event in events {
        table.add_row(vec![
            Cell::new(event.created_at.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(&event.action),
            Cell::new(&event.dni),
            Cell::new(&event.source_ip),
            Cell::new(&event.user_agent),
        ]);
    }

    println!("{table}");
}
