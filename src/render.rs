//! HTML rendering of a container listing.
//!
//! A layout is an HTML document with a single `{{ containers }}` slot that
//! receives the table rows. The default layout is compiled in; a layout file
//! can be configured instead and is read on every request.

use std::borrow::Cow;
use std::fmt::Write;
use std::path::Path;

use crate::error::RenderError;
use crate::view::ContainerView;

pub const SLOT: &str = "{{ containers }}";

pub const DEFAULT_LAYOUT: &str = include_str!("../web/templates/index.html");

pub async fn load_layout(path: Option<&Path>) -> Result<Cow<'static, str>, RenderError> {
    let Some(path) = path else {
        return Ok(Cow::Borrowed(DEFAULT_LAYOUT));
    };
    let layout = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| RenderError::Load {
            path: path.to_path_buf(),
            source,
        })?;
    if !layout.contains(SLOT) {
        return Err(RenderError::MissingSlot {
            path: path.to_path_buf(),
        });
    }
    Ok(Cow::Owned(layout))
}

pub fn render_page(views: &[ContainerView], layout: &str) -> Result<String, RenderError> {
    let (head, tail) = layout.split_once(SLOT).unwrap_or((layout, ""));

    let mut page = String::with_capacity(layout.len() + views.len() * 1024);
    page.push_str(head);
    if views.is_empty() {
        page.push_str("      <tr><td class=\"empty\" colspan=\"10\">No containers</td></tr>\n");
    }
    for view in views {
        write_row(&mut page, view)?;
    }
    page.push_str(tail);
    Ok(page)
}

fn write_row(out: &mut String, view: &ContainerView) -> std::fmt::Result {
    writeln!(out, "      <tr id=\"{}\">", escape(&view.id))?;
    writeln!(
        out,
        "        <td><strong>{}</strong><br><code>{}</code></td>",
        escape(view.display_name()),
        escape(view.short_id())
    )?;
    writeln!(
        out,
        "        <td><span class=\"state state-{}\">{}</span><br>{}</td>",
        escape(&view.state),
        escape(&view.state),
        escape(&view.status)
    )?;
    writeln!(
        out,
        "        <td>{}<br><code>{}</code></td>",
        escape(&view.image),
        escape(&view.image_id)
    )?;
    writeln!(out, "        <td><code>{}</code></td>", escape(&view.command))?;
    writeln!(
        out,
        "        <td><time datetime=\"{}\">{}</time></td>",
        view.created.to_rfc3339(),
        view.created.format("%Y-%m-%d %H:%M:%S UTC")
    )?;

    out.push_str("        <td><ul>");
    for port in &view.ports {
        match port.public_port {
            Some(public) if public != 0 => write!(
                out,
                "<li>{}:{} &rarr; {}/{}</li>",
                escape(port.ip.as_deref().unwrap_or("")),
                public,
                port.private_port,
                escape(&port.port_type)
            )?,
            _ => write!(
                out,
                "<li>{}/{}</li>",
                port.private_port,
                escape(&port.port_type)
            )?,
        }
    }
    out.push_str("</ul></td>\n");

    out.push_str("        <td><ul>");
    for (network, ip) in &view.network_ips {
        write!(out, "<li>{}: {}</li>", escape(network), escape(ip))?;
    }
    out.push_str("</ul></td>\n");

    out.push_str("        <td><ul>");
    for mount in &view.mounts {
        write!(
            out,
            "<li>{} &rarr; {} ({}{})</li>",
            escape(mount.name.as_deref().unwrap_or(mount.source.as_str())),
            escape(&mount.destination),
            escape(&mount.mount_type),
            if mount.rw { "" } else { ", ro" }
        )?;
    }
    out.push_str("</ul></td>\n");

    out.push_str("        <td><ul>");
    for (key, value) in &view.labels {
        write!(out, "<li>{}={}</li>", escape(key), escape(value))?;
    }
    out.push_str("</ul></td>\n");

    if view.public_port != 0 {
        writeln!(
            out,
            "        <td><a href=\"{url}\">{url}</a></td>",
            url = escape(&view.url)
        )?;
    } else {
        out.push_str("        <td></td>\n");
    }
    out.push_str("      </tr>\n");
    Ok(())
}

pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }
    let mut escaped = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}
