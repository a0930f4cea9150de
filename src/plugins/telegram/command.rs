use std::sync::Arc;

use teloxide::{
  prelude::*,
  utils::command::{BotCommands, ParseError},
};
use uuid::Uuid;

use super::ReplyBot;
use crate::{
  entity::ProgressStatus,
  package::{self, PackageCode},
  prelude::*,
  state::AppState,
  sv::progress::RefreshReport,
};

fn usage(text: &'static str) -> ParseError {
  ParseError::IncorrectFormat(text.into())
}

fn parse_new_talent(
  input: String,
) -> std::result::Result<(String, Option<String>), ParseError> {
  let (name, email) = match input.split_once('|') {
    Some((name, email)) => (name.trim(), Some(email.trim())),
    None => (input.trim(), None),
  };

  if name.is_empty() {
    return Err(usage("Usage: /newtalent <full name> [| email]"));
  }

  Ok((name.to_string(), email.filter(|e| !e.is_empty()).map(str::to_string)))
}

/// `<key> <order> <free text>`
fn parse_ordered(
  input: &str,
  text: &'static str,
) -> std::result::Result<(String, i32, String), ParseError> {
  let mut parts = input.trim().splitn(3, ' ');
  let key = parts.next().unwrap_or_default();
  let order = parts.next().and_then(|order| order.parse().ok());
  let rest = parts.next().unwrap_or_default().trim();

  match order {
    Some(order) if !key.is_empty() && !rest.is_empty() => {
      Ok((key.to_string(), order, rest.to_string()))
    }
    _ => Err(usage(text)),
  }
}

fn parse_new_level(
  input: String,
) -> std::result::Result<(String, i32, String), ParseError> {
  parse_ordered(&input, "Usage: /newlevel <code> <order> <name>")
}

fn parse_new_lesson(
  input: String,
) -> std::result::Result<(String, i32, String), ParseError> {
  parse_ordered(&input, "Usage: /newlesson <course_id> <order> <title>")
}

fn parse_new_course(
  input: String,
) -> std::result::Result<(String, String), ParseError> {
  let mut parts = input.trim().splitn(2, ' ');
  let level = parts.next().unwrap_or_default();
  let title = parts.next().unwrap_or_default().trim();

  if level.is_empty() || title.is_empty() {
    return Err(usage("Usage: /newcourse <level_code | -> <title>"));
  }

  Ok((level.to_string(), title.to_string()))
}

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
  Help,
  Talents,
  #[command(parse_with = parse_new_talent)]
  NewTalent {
    full_name: String,
    email: Option<String>,
  },
  #[command(parse_with = "split")]
  Assign {
    talent: String,
    package: String,
  },
  Revoke(String),
  Info(String),
  Packages,
  Levels,
  #[command(parse_with = parse_new_level)]
  NewLevel {
    code: String,
    order_index: i32,
    name: String,
  },
  Courses,
  #[command(parse_with = parse_new_course)]
  NewCourse {
    level: String,
    title: String,
  },
  #[command(parse_with = parse_new_lesson)]
  NewLesson {
    course: String,
    order_index: i32,
    title: String,
  },
  /// Show or hide a lesson
  #[command(parse_with = "split")]
  Lesson {
    lesson: String,
    state: String,
  },
  #[command(parse_with = "split")]
  Gate {
    course: String,
    package: String,
  },
  #[command(parse_with = "split")]
  Ungate {
    course: String,
    package: String,
  },
}

const ADMIN_HELP: &str = "\
<b>📋 Admin Commands</b>

<b>Talents:</b>
/talents - List talents and their packages
/newtalent &lt;full name&gt; [| email] - Register a talent
/assign &lt;talent_id&gt; &lt;start|advanced|premium&gt; - Set package
/revoke &lt;talent_id&gt; - Remove package
/info &lt;talent_id&gt; - Package, journey and package history

<b>Catalog:</b>
/packages - Tiers and how many talents hold each
/levels - Training levels
/newlevel &lt;code&gt; &lt;order&gt; &lt;name&gt; - Add a level
/courses - Courses with their packages
/newcourse &lt;level_code | -&gt; &lt;title&gt; - Add a course
/newlesson &lt;course_id&gt; &lt;order&gt; &lt;title&gt; - Add a lesson
/lesson &lt;lesson_id&gt; &lt;on|off&gt; - Show or hide a lesson
/gate &lt;course_id&gt; &lt;package&gt; - Offer course in a package
/ungate &lt;course_id&gt; &lt;package&gt; - Withdraw course from a package

/help - Show this message";

pub async fn handle(
  app: Arc<AppState>,
  bot: ReplyBot,
  cmd: Command,
) -> ResponseResult<()> {
  if !app.is_admin(bot.user_id) {
    bot.reply_html("⛔ This bot is for admins only.").await?;
    return Ok(());
  }

  let admin = bot.user_id;
  let result: Result<String> = match cmd {
    Command::Help => Ok(ADMIN_HELP.into()),
    Command::Talents => talents(&app).await,
    Command::NewTalent { full_name, email } => {
      new_talent(&app, full_name, email).await
    }
    Command::Assign { talent, package } => {
      assign(&app, admin, &talent, &package).await
    }
    Command::Revoke(talent) => revoke(&app, admin, &talent).await,
    Command::Info(talent) => info(&app, &talent).await,
    Command::Packages => packages(&app).await,
    Command::Levels => levels(&app).await,
    Command::NewLevel { code, order_index, name } => {
      new_level(&app, code, order_index, name).await
    }
    Command::Courses => courses(&app).await,
    Command::NewCourse { level, title } => new_course(&app, &level, title).await,
    Command::NewLesson { course, order_index, title } => {
      new_lesson(&app, &course, order_index, title).await
    }
    Command::Lesson { lesson, state } => {
      toggle_lesson(&app, &lesson, &state).await
    }
    Command::Gate { course, package } => gate(&app, &course, &package).await,
    Command::Ungate { course, package } => {
      ungate(&app, &course, &package).await
    }
  };

  match result {
    Ok(text) => bot.reply_html_chunked(text).await?,
    Err(err) => {
      if err.is_transient() {
        warn!("Admin command failed: {err}");
      }
      let text = format!("❌ {}", utils::escape_html(&err.user_message()));
      bot.reply_html(text).await?;
    }
  }

  Ok(())
}

fn status_icon(status: ProgressStatus) -> &'static str {
  match status {
    ProgressStatus::NotStarted => "⚪",
    ProgressStatus::InProgress => "🟡",
    ProgressStatus::Completed => "✅",
  }
}

fn parse_code(input: &str) -> Result<PackageCode> {
  input.trim().to_lowercase().parse()
}

async fn talents(app: &AppState) -> Result<String> {
  let talents = app.sv().talent.all_with_packages().await?;
  if talents.is_empty() {
    return Ok("📭 No talents registered.".into());
  }

  let mut text = format!("👥 <b>Talents (Total: {})</b>\n\n", talents.len());
  for (i, (talent, package)) in talents.iter().enumerate() {
    let package = match package {
      Some(row) => utils::escape_html(&row.package_code),
      None => "<i>no package</i>".into(),
    };
    text.push_str(&format!(
      "<b>{}.</b> {} <code>{}</code> · {}\n",
      i + 1,
      utils::escape_html(&talent.full_name),
      talent.id,
      package
    ));
  }
  Ok(text)
}

async fn new_talent(
  app: &AppState,
  full_name: String,
  email: Option<String>,
) -> Result<String> {
  let talent = app.sv().talent.create(full_name, email).await?;
  Ok(format!(
    "✅ Talent <b>{}</b> registered:\n<code>{}</code>",
    utils::escape_html(&talent.full_name),
    talent.id
  ))
}

async fn assign(
  app: &AppState,
  admin: i64,
  talent: &str,
  code: &str,
) -> Result<String> {
  let talent_id = utils::parse_id(talent)?;
  let code = parse_code(code)?;

  app.sv().talent.assign_package(talent_id, code, Some(admin)).await?;
  app.invalidate(talent_id);

  let info = code.info();
  Ok(format!(
    "✅ Package <b>{}</b> ({}) assigned to <code>{talent_id}</code>",
    info.name, info.price
  ))
}

async fn revoke(app: &AppState, admin: i64, talent: &str) -> Result<String> {
  let talent_id = utils::parse_id(talent)?;

  if app.sv().talent.revoke_package(talent_id, Some(admin)).await? {
    app.invalidate(talent_id);
    Ok(format!("🚫 Package revoked from <code>{talent_id}</code>"))
  } else {
    Ok("ℹ️ Talent holds no package".into())
  }
}

async fn info(app: &AppState, talent: &str) -> Result<String> {
  let talent_id = utils::parse_id(talent)?;
  let sv = app.sv();

  let talent = sv.talent.by_id(talent_id).await?.ok_or(Error::TalentNotFound)?;
  let (package, history, entitlement) = futures::try_join!(
    sv.talent.package_of(talent_id),
    sv.talent.history(talent_id),
    sv.access.load(talent_id),
  )?;
  let journey = sv.progress.journey(talent_id, &entitlement).await?;

  let package = match (&package, entitlement.package) {
    (Some(row), Some(code)) => format!(
      "<b>{}</b> since {}",
      code.info().name,
      utils::format_date(row.purchased_at)
    ),
    (Some(row), None) => format!(
      "⚠️ unknown code <code>{}</code>",
      utils::escape_html(&row.package_code)
    ),
    (None, _) => "<i>none</i>".into(),
  };
  let upgrade = entitlement
    .upgrade()
    .map(|info| format!("\nUpgrade: {} ({})", info.name, info.price))
    .unwrap_or_default();

  let mut text = format!(
    "👤 <b>Talent Info</b>\n\
    ID: <code>{}</code>\n\
    Name: {}\n\
    Email: {}\n\
    Registered: {}\n\n\
    📦 <b>Package:</b> {}{}\n\
    Unlocked courses: {}\n\n\
    🧭 <b>Journey</b>\n",
    talent.id,
    utils::escape_html(&talent.full_name),
    utils::escape_html(talent.email.as_deref().unwrap_or("-")),
    utils::format_date(talent.created_at),
    package,
    upgrade,
    entitlement.unlocked.len(),
  );

  for level in &journey {
    text.push_str(&format!(
      "{} {}{}: {}% ({}/{} open)\n",
      status_icon(level.progress.status),
      utils::escape_html(&level.name),
      if level.is_current { " ⬅️" } else { "" },
      level.progress.percentage,
      level.progress.accessible_count,
      level.progress.course_count,
    ));
  }
  if journey.is_empty() {
    text.push_str(" <i>No training levels</i>\n");
  }

  text.push_str("\n📜 <b>Package history</b>\n");
  for change in history.iter().take(5) {
    text.push_str(&format!(
      "{}: {} → {}{}\n",
      utils::format_date(change.changed_at),
      change.previous_code.as_deref().unwrap_or("-"),
      change.new_code.as_deref().unwrap_or("-"),
      change.changed_by.map(|id| format!(" by <code>{id}</code>")).unwrap_or_default(),
    ));
  }
  if history.is_empty() {
    text.push_str(" <i>No changes</i>");
  }

  Ok(text)
}

async fn packages(app: &AppState) -> Result<String> {
  let stats = app.sv().talent.package_stats().await?;

  let mut text = String::from("📦 <b>Packages</b>\n\n");
  for info in package::catalog() {
    let holders = match info.code {
      PackageCode::Start => stats.start,
      PackageCode::Advanced => stats.advanced,
      PackageCode::Premium => stats.premium,
    };
    text.push_str(&format!(
      "• <b>{}</b> <code>{}</code> {}: {holders} talents\n",
      info.name, info.code, info.price
    ));
  }
  text.push_str(&format!("\nWithout package: {}", stats.none));
  if stats.unknown > 0 {
    text.push_str(&format!("\n⚠️ Unknown codes: {}", stats.unknown));
  }
  Ok(text)
}

async fn levels(app: &AppState) -> Result<String> {
  let levels = app.sv().catalog.levels().await?;
  if levels.is_empty() {
    return Ok("📭 No training levels.".into());
  }

  let mut text = String::from("🧭 <b>Training Levels</b>\n\n");
  for level in levels {
    text.push_str(&format!(
      "{}. <b>{}</b> <code>{}</code>\n",
      level.order_index,
      utils::escape_html(&level.name),
      utils::escape_html(&level.code)
    ));
  }
  Ok(text)
}

async fn new_level(
  app: &AppState,
  code: String,
  order_index: i32,
  name: String,
) -> Result<String> {
  let catalog = app.sv().catalog;
  if catalog.level_by_code(&code).await?.is_some() {
    return Err(Error::InvalidArgs(format!("Level `{code}` already exists")));
  }

  let level = catalog.create_level(code, name, order_index).await?;
  Ok(format!(
    "✅ Level <b>{}</b> created:\n<code>{}</code>",
    utils::escape_html(&level.name),
    level.id
  ))
}

async fn courses(app: &AppState) -> Result<String> {
  let catalog = app.sv().catalog;
  let (courses, gates, counts, levels) = futures::try_join!(
    catalog.courses(),
    catalog.gates(),
    catalog.lesson_counts(),
    catalog.levels(),
  )?;

  if courses.is_empty() {
    return Ok("📭 No active courses.".into());
  }

  let levels: HashMap<Uuid, String> =
    levels.into_iter().map(|level| (level.id, level.name)).collect();

  let mut text = format!("📚 <b>Courses (Total: {})</b>\n", courses.len());
  for course in &courses {
    let codes = gates.get(&course.id).map(Vec::as_slice).unwrap_or_default();
    let offer = match package::cheapest(codes.iter().map(String::as_str)) {
      Some(code) => format!("from {} [{}]", code.info().name, codes.join(", ")),
      None => "⚠️ not offered".into(),
    };
    let level = course
      .level_id
      .and_then(|id| levels.get(&id))
      .map_or("-", String::as_str);

    text.push_str(&format!(
      "\n<b>{}</b>\n<code>{}</code>\nLevel: {} · {} lessons · {}\n",
      utils::escape_html(&course.title),
      course.id,
      utils::escape_html(level),
      counts.get(&course.id).copied().unwrap_or(0),
      utils::escape_html(&offer),
    ));
  }
  Ok(text)
}

async fn new_course(app: &AppState, level: &str, title: String) -> Result<String> {
  let catalog = app.sv().catalog;
  let level_id = match level {
    "-" => None,
    code => {
      let level = catalog.level_by_code(code).await?.ok_or(Error::LevelNotFound)?;
      Some(level.id)
    }
  };

  let course = catalog.create_course(level_id, title, None).await?;
  Ok(format!(
    "✅ Course <b>{}</b> created:\n<code>{}</code>\nUse /gate to offer it in a package.",
    utils::escape_html(&course.title),
    course.id
  ))
}

async fn new_lesson(
  app: &AppState,
  course: &str,
  order_index: i32,
  title: String,
) -> Result<String> {
  let course_id = utils::parse_id(course)?;
  let sv = app.sv();

  let lesson = sv.catalog.create_lesson(course_id, title, order_index).await?;
  let report = sv.progress.refresh_course(course_id).await?;

  Ok(format!(
    "✅ Lesson <b>{}</b> added:\n<code>{}</code>\n{}",
    utils::escape_html(&lesson.title),
    lesson.id,
    refresh_summary(report)
  ))
}

async fn toggle_lesson(app: &AppState, lesson: &str, state: &str) -> Result<String> {
  let lesson_id = utils::parse_id(lesson)?;
  let active = match state.trim() {
    "on" => true,
    "off" => false,
    _ => return Err(Error::InvalidArgs("Usage: /lesson <lesson_id> <on|off>".into())),
  };
  let sv = app.sv();

  let course_id = sv.catalog.set_lesson_active(lesson_id, active).await?;
  let report = sv.progress.refresh_course(course_id).await?;

  Ok(format!(
    "{} Lesson {}\n{}",
    if active { "✅" } else { "🙈" },
    if active { "shown" } else { "hidden" },
    refresh_summary(report)
  ))
}

fn refresh_summary(report: RefreshReport) -> String {
  let mut text = format!("Progress recomputed for {} talents", report.refreshed);
  if report.failed > 0 {
    text.push_str(&format!("\n⚠️ {} failed, see logs", report.failed));
  }
  text
}

async fn gate(app: &AppState, course: &str, code: &str) -> Result<String> {
  let course_id = utils::parse_id(course)?;
  let code = parse_code(code)?;

  app.sv().catalog.gate(course_id, code).await?;
  app.invalidate_all();

  Ok(format!("🔓 Course offered in <b>{}</b>", code.info().name))
}

async fn ungate(app: &AppState, course: &str, code: &str) -> Result<String> {
  let course_id = utils::parse_id(course)?;
  let code = parse_code(code)?;

  if app.sv().catalog.ungate(course_id, code).await? {
    app.invalidate_all();
    Ok(format!("🔒 Course withdrawn from <b>{}</b>", code.info().name))
  } else {
    Ok(format!("ℹ️ Course was not offered in <b>{}</b>", code.info().name))
  }
}
