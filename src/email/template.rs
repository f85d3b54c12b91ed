//! Subject line and HTML body of the weekly feedback mail.

use crate::email::FeedbackRow;
use crate::report::html::escape_html;
use crate::sheet::utils::format_number;

const LIKE_LOW: &str = "background-color:#FF4C4C; color:white;";
const LIKE_HIGH: &str = "background-color:#4CAF50; color:white;";

/// Inline style for the likes cell: red below 5, green above 5, none at 5.
pub fn like_style(likes: f64) -> &'static str {
    if likes < 5.0 {
        LIKE_LOW
    } else if likes > 5.0 {
        LIKE_HIGH
    } else {
        ""
    }
}

pub fn render_subject(prefix: &str, row: &FeedbackRow) -> String {
    format!("{} - {}, {} ({})", prefix, row.week, row.year, row.tool)
}

pub fn render_html(row: &FeedbackRow) -> String {
    let user = escape_html(&row.user);
    let likes = escape_html(&format_number(row.likes));
    let dislikes = escape_html(&format_number(row.dislikes));
    let week = escape_html(&row.week);
    let year = escape_html(&row.year);
    let tool = escape_html(&row.tool);
    let comment = escape_html(&row.comment);
    let like_color = like_style(row.likes);

    format!(
        r#"<html>
<body style="font-family: 'Segoe UI', Arial, sans-serif; margin: 0; padding: 20px; background-color: #f8f9fa;">
  <div style="max-width: 600px; margin: 0 auto; background-color: white; border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); overflow: hidden;">
    <div style="background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); padding: 30px; text-align: center;">
      <h1 style="color: white; margin: 0; font-size: 24px; font-weight: 300;">Weekly Feedback Report</h1>
      <p style="color: rgba(255,255,255,0.9); margin: 10px 0 0 0; font-size: 14px;">Performance Analytics Dashboard</p>
    </div>
    <div style="padding: 30px;">
      <h2 style="color: #333; margin: 0 0 20px 0; font-size: 18px;">Dear {user},</h2>
      <p style="color: #666; line-height: 1.6; margin: 0 0 25px 0;">Please find below your feedback report for the period. It summarises the feedback your work received and the areas flagged for improvement.</p>
      <div style="background-color: #f8f9fa; padding: 20px; border-radius: 6px; margin: 20px 0;">
        <h3 style="color: #333; margin: 0 0 15px 0; font-size: 16px;">Performance Summary</h3>
        <div style="display: flex; justify-content: space-between; flex-wrap: wrap;">
          <div style="text-align: center; margin: 10px;"><div style="font-size: 24px; font-weight: bold; color: #667eea;">{likes}</div><div style="font-size: 12px; color: #666;">Positive Feedback</div></div>
          <div style="text-align: center; margin: 10px;"><div style="font-size: 24px; font-weight: bold; color: #dc3545;">{dislikes}</div><div style="font-size: 12px; color: #666;">Areas for Improvement</div></div>
          <div style="text-align: center; margin: 10px;"><div style="font-size: 24px; font-weight: bold; color: #28a745;">{week}</div><div style="font-size: 12px; color: #666;">Reporting Period</div></div>
        </div>
      </div>
      <table style="width: 100%; border-collapse: collapse; margin: 25px 0; background-color: white;">
        <thead>
          <tr style="background-color: #f8f9fa;"><th style="padding: 15px; text-align: left; border-bottom: 2px solid #dee2e6;">Metric</th><th style="padding: 15px; text-align: left; border-bottom: 2px solid #dee2e6;">Value</th></tr>
        </thead>
        <tbody>
          <tr><td style="padding: 12px 15px; border-bottom: 1px solid #dee2e6;">Tool</td><td style="padding: 12px 15px; border-bottom: 1px solid #dee2e6;">{tool}</td></tr>
          <tr><td style="padding: 12px 15px; border-bottom: 1px solid #dee2e6;">Period</td><td style="padding: 12px 15px; border-bottom: 1px solid #dee2e6;">{week}, {year}</td></tr>
          <tr><td style="padding: 12px 15px; border-bottom: 1px solid #dee2e6;">Positive Feedback</td><td style="padding: 12px 15px; border-bottom: 1px solid #dee2e6; {like_color} text-align: center; font-weight: bold;">{likes}</td></tr>
          <tr><td style="padding: 12px 15px; border-bottom: 1px solid #dee2e6;">Improvement Areas</td><td style="padding: 12px 15px; border-bottom: 1px solid #dee2e6; text-align: center; font-weight: bold; color: #dc3545;">{dislikes}</td></tr>
          <tr><td style="padding: 12px 15px; border-bottom: 1px solid #dee2e6;">Comments</td><td style="padding: 12px 15px; border-bottom: 1px solid #dee2e6; font-style: italic;">{comment}</td></tr>
        </tbody>
      </table>
      <p style="color: #666; line-height: 1.6; margin: 25px 0 0 0;">Thank you for your continued work. Reach out if you would like to discuss this report.</p>
    </div>
    <div style="background-color: #f8f9fa; padding: 20px; text-align: center; border-top: 1px solid #dee2e6;">
      <p style="color: #6c757d; margin: 0; font-size: 14px;">Best regards,<br><strong style="color: #495057;">Performance Analytics Team</strong></p>
      <p style="color: #adb5bd; margin: 10px 0 0 0; font-size: 12px;">This is an automated report. Please do not reply to this email.</p>
    </div>
  </div>
</body>
</html>
"#
    )
}
