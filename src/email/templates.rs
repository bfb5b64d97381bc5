pub fn render_welcome(name: &str, base_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Welcome to Leadhub</h2>
    <p>Hi {name},</p>
    <p>Your organization is ready. You can log in and start adding leads at:</p>
    <p><a href="{base_url}" style="display: inline-block; padding: 10px 20px; background: #0070f3; color: white; text-decoration: none; border-radius: 4px;">Log In</a></p>
    <p style="color: #666; font-size: 14px;">If you didn't expect this email, you can ignore it.</p>
</body>
</html>"#
    )
}

pub fn render_agent_invite(name: &str, temp_password: &str, base_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>You were added as an agent</h2>
    <p>Hi {name},</p>
    <p>An organizer added you as an agent on Leadhub. Log in with the temporary password below and change it.</p>
    <p><code>{temp_password}</code></p>
    <p><a href="{base_url}" style="display: inline-block; padding: 10px 20px; background: #0070f3; color: white; text-decoration: none; border-radius: 4px;">Log In</a></p>
</body>
</html>"#
    )
}

pub fn render_lead_created(base_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>A lead has been created</h2>
    <p>Go to the site to see the new lead.</p>
    <p><a href="{base_url}/leads" style="display: inline-block; padding: 10px 20px; background: #0070f3; color: white; text-decoration: none; border-radius: 4px;">View Leads</a></p>
</body>
</html>"#
    )
}
