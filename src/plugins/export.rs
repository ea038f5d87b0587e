//! /export_users - roster CSV export.

use teloxide::prelude::*;
use teloxide::types::InputFile;
use tracing::info;

use super::{ensure_admin, reply};
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::ExportRow;
use crate::utils::csv_escape;

/// Handle /export_users: send the roster as a CSV document.
pub async fn export_users_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(admin_id) = ensure_admin(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let rows = state.stats.export_rows().await?;
    if rows.is_empty() {
        reply(&bot, &msg, "📋 No users to export.").await?;
        return Ok(());
    }

    let count = rows.len();
    let csv = render_csv(&rows);

    info!("Admin {} exported {} roster rows", admin_id, count);

    bot.send_document(
        msg.chat.id,
        InputFile::memory(csv).file_name("users.csv"),
    )
    .caption(format!("📋 Roster export: {} users", count))
    .await?;

    Ok(())
}

fn render_csv(rows: &[ExportRow]) -> String {
    let mut csv =
        String::from("user_id,username,role,allowed,car,created_at,question_count,src,campaign,ad\n");
    for row in rows {
        let fields = [
            row.user.user_id.to_string(),
            row.user.username.clone().unwrap_or_default(),
            row.user.role.as_str().to_string(),
            row.user.allowed.to_string(),
            row.user.car.clone().unwrap_or_default(),
            row.user.created_at.to_string(),
            row.question_count.to_string(),
            row.src.clone().unwrap_or_default(),
            row.campaign.clone().unwrap_or_default(),
            row.ad.clone().unwrap_or_default(),
        ];
        let line: Vec<String> = fields.iter().map(|f| csv_escape(f)).collect();
        csv.push_str(&line.join(","));
        csv.push('\n');
    }
    csv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::RosterUser;

    #[test]
    fn test_render_csv() {
        let mut user = RosterUser::new(42, Some("bob".to_string()));
        user.car = Some("Haval Jolion, 2022".to_string());
        let rows = vec![ExportRow {
            user,
            question_count: 5,
            src: Some("tg".to_string()),
            campaign: None,
            ad: None,
        }];

        let csv = render_csv(&rows);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "user_id,username,role,allowed,car,created_at,question_count,src,campaign,ad"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("42,bob,user,true,\"Haval Jolion, 2022\","));
        assert!(row.ends_with(",5,tg,,"));
    }
}
