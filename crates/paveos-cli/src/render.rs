//! Plain-text rendering of view-model state.

use crm_views::{
    format_currency, Board, HeadlineStat, Notification, NotificationLevel, PipelineMetrics,
    SourceSlice, StagePoint,
};
use paveos_api::{Lead, LeadStats, Message, MessageDirection, User};

pub fn notification(notification: &Notification) -> String {
    let marker = match notification.level {
        NotificationLevel::Success => "✓",
        NotificationLevel::Error => "✗",
    };
    format!("{marker} {}", notification.message)
}

pub fn user(user: &User) -> String {
    let mut line = format!("{} <{}>", user.name, user.email);
    if let Some(plan) = &user.subscription_plan {
        line.push_str(&format!(" [{plan}]"));
    }
    line
}

pub fn lead_row(lead: &Lead) -> String {
    let contact = lead
        .email
        .as_deref()
        .or(lead.discord_username.as_deref())
        .unwrap_or("-");
    let unread = if lead.unread_count > 0 {
        format!("  ({} unread)", lead.unread_count)
    } else {
        String::new()
    };
    format!(
        "{:<26} {:<24} {:<28} {:<10} {:>10}{unread}",
        lead.id,
        lead.name,
        contact,
        lead.status.display_name(),
        lead.estimated_value.map(format_currency).unwrap_or_default(),
    )
}

pub fn stats(stats: &LeadStats) -> String {
    let stages: Vec<String> = stats
        .by_status
        .iter()
        .map(|(status, count)| format!("{} {count}", status.display_name()))
        .collect();
    format!("{} leads: {}", stats.total, stages.join(", "))
}

pub fn message_line(message: &Message) -> String {
    let author = match message.direction {
        MessageDirection::Incoming => message.author_username.as_deref().unwrap_or("User"),
        MessageDirection::Outgoing => "you",
    };
    format!(
        "[{}] {author}: {}",
        message.created_at.format("%Y-%m-%d %H:%M"),
        message.content
    )
}

pub fn board(board: &Board<'_>) -> String {
    let mut out = String::new();
    for column in &board.columns {
        out.push_str(&format!(
            "{} ({}, {})\n",
            column.stage.display_name(),
            column.leads.len(),
            format_currency(column.total_value)
        ));
        for lead in &column.leads {
            out.push_str(&format!("  - {} {}\n", lead.id, lead.name));
        }
    }
    if !board.unmapped.is_empty() {
        out.push_str(&format!("Unmapped ({})\n", board.unmapped.len()));
        for lead in &board.unmapped {
            out.push_str(&format!("  - {} {} [{}]\n", lead.id, lead.name, lead.status));
        }
    }
    out
}

pub fn metrics(metrics: &PipelineMetrics) -> String {
    format!(
        "Active {} ({}), won {} ({}), avg {} per active deal, win rate {}%",
        metrics.active_count,
        format_currency(metrics.active_value),
        metrics.won_count,
        format_currency(metrics.won_value),
        format_currency(metrics.average_active_value),
        metrics.win_rate,
    )
}

pub fn headline(stats: &[HeadlineStat]) -> String {
    stats
        .iter()
        .map(|stat| format!("{:<14} {:>12}  {}", stat.title, stat.value, stat.description))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn stage_series(points: &[StagePoint]) -> String {
    points
        .iter()
        .map(|point| {
            format!(
                "{:<16} {:>4}  {}",
                point.label,
                point.count,
                format_currency(point.value)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn source_series(slices: &[SourceSlice]) -> String {
    slices
        .iter()
        .map(|slice| {
            format!(
                "{:<12} {:>4} leads, {:>3} won, {}",
                slice.label,
                slice.count,
                slice.won,
                format_currency(slice.revenue)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn message(direction: MessageDirection, author: Option<&str>) -> Message {
        Message {
            id: "m1".into(),
            lead_id: Some("L1".into()),
            content: "hello".into(),
            direction,
            author_username: author.map(str::to_string),
            is_read: false,
            attachments: Vec::new(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_notification_markers() {
        assert_eq!(notification(&Notification::success("Saved")), "✓ Saved");
        assert_eq!(notification(&Notification::error("Nope")), "✗ Nope");
    }

    #[test]
    fn test_message_line_names_author() {
        assert_eq!(
            message_line(&message(MessageDirection::Incoming, Some("buyer42"))),
            "[2024-05-01 09:30] buyer42: hello"
        );
        assert_eq!(
            message_line(&message(MessageDirection::Incoming, None)),
            "[2024-05-01 09:30] User: hello"
        );
        assert_eq!(
            message_line(&message(MessageDirection::Outgoing, Some("me"))),
            "[2024-05-01 09:30] you: hello"
        );
    }
}
