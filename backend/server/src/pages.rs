//! # Pages
//!
//! Server-rendered HTML for every route. Each page is the shared layout (navigation bar,
//! body, footer) around the current state of one screen.
//!
//! All user and store values go through [`escape`]. Scripts are limited to small
//! progressive enhancements: live field validation, the PRN button toggle and disabling
//! a form's button while its submission is pending.
use records::{Gender, UserRecord};

use crate::{
    screens::{
        contact::{Banner, ContactField, ContactScreen},
        dashboard::{DashboardScreen, VitalsView},
        login::LoginScreen,
        navigation::Navigation,
        registration::{Field, RegistrationScreen, is_checked},
    },
    utils::escape,
};

const SLOGANS: [&str; 3] = [
    "Your Heart Health Matters!",
    "Track Your Weight with Precision!",
    "Stay on Top of Your Body Temperature!",
];

const PARAMETERS: [(&str, &str); 3] = [
    (
        "Heart-Rate & SpO2",
        "The heart-rate sensor follows blood volume changes to report beats per minute. \
         The SpO2 sensor measures blood oxygen through light absorption.",
    ),
    (
        "Weight sensor",
        "A load cell turns weight into an electrical signal for precise, repeatable measurements.",
    ),
    (
        "Body temperature",
        "An infrared sensor reads body temperature without contact, quickly and accurately.",
    ),
];

const PENDING_SCRIPT: &str = r#"<script>
document.querySelectorAll("form[data-pending]").forEach(function (form) {
  form.addEventListener("submit", function () {
    var button = form.querySelector("button[type=submit]");
    if (button) { button.disabled = true; button.textContent = form.dataset.pending; }
  });
});
</script>"#;

const VALIDATE_SCRIPT: &str = r##"<script>
document.querySelectorAll("#register [name]").forEach(function (input) {
  function check() {
    var value = input.type === "checkbox" ? (input.checked ? "on" : "") : input.value;
    var body = new URLSearchParams({ field: input.name, value: value });
    fetch("/register/validate", { method: "POST", body: body })
      .then(function (response) { return response.json(); })
      .then(function (result) {
        var slot = document.getElementById("error-" + result.field);
        if (slot) { slot.textContent = result.error; }
      });
  }
  input.addEventListener("blur", check);
  input.addEventListener("change", check);
});
</script>"##;

const PRN_SCRIPT: &str = r#"<script>
(function () {
  var input = document.getElementById("prn");
  var button = document.getElementById("verify");
  if (!input || !button) { return; }
  input.addEventListener("input", function () {
    button.disabled = Array.from(input.value).length !== 12;
    var error = document.getElementById("prn-error");
    if (error) { error.remove(); }
  });
})();
</script>"#;

/// What the navigation bar needs to render.
#[derive(Debug, Clone, Copy)]
pub struct Chrome<'a> {
    pub signed_in: bool,
    pub menu_open: bool,
    pub path: &'a str,
}

impl<'a> Chrome<'a> {
    pub fn new(navigation: &Navigation, path: &'a str) -> Self {
        Self {
            signed_in: navigation.is_signed_in(),
            menu_open: navigation.menu_open(),
            path,
        }
    }
}

fn layout(title: &str, chrome: Chrome<'_>, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | HealthCare</title>
</head>
<body>
{nav}
<main>
{body}
</main>
{footer}
{PENDING_SCRIPT}
</body>
</html>"#,
        title = escape(title),
        nav = navigation(chrome),
        footer = footer(),
    )
}

fn navigation(chrome: Chrome<'_>) -> String {
    let account = if chrome.signed_in {
        r#"<li><form method="post" action="/logout"><button type="submit">Logout</button></form></li>"#
            .to_string()
    } else {
        r#"<li><a href="/login">Login</a></li>
<li><a href="/register">Register</a></li>"#
            .to_string()
    };
    let menu_state = if chrome.menu_open { "open" } else { "closed" };

    format!(
        r#"<nav>
<a href="/" class="brand">HealthCare</a>
<form method="post" action="/menu" class="menu-toggle">
<input type="hidden" name="return_to" value="{path}">
<button type="submit" aria-expanded="{expanded}">Menu</button>
</form>
<ul class="menu {menu_state}">
<li><a href="/">Home</a></li>
<li><a href="/about">About</a></li>
<li><a href="/dashboard">Dashboard</a></li>
<li><a href="/contact">Contact</a></li>
{account}
</ul>
</nav>"#,
        path = escape(chrome.path),
        expanded = chrome.menu_open,
    )
}

fn footer() -> &'static str {
    r#"<footer>
<p>© 2025 HealthCare</p>
<p>Your Health, Our Commitment.</p>
<ul class="social">
<li><a href="https://twitter.com" rel="noopener">Twitter</a></li>
<li><a href="https://linkedin.com" rel="noopener">LinkedIn</a></li>
<li><a href="https://instagram.com" rel="noopener">Instagram</a></li>
</ul>
</footer>"#
}

fn section(title: &str, content: &str) -> String {
    format!(
        "<section>\n<h2>{}</h2>\n<p>{}</p>\n</section>",
        escape(title),
        escape(content)
    )
}

fn banner(class: &str, message: &str) -> String {
    format!(r#"<div class="banner {class}">{}</div>"#, escape(message))
}

pub fn landing(chrome: Chrome<'_>) -> String {
    let slogans: String = SLOGANS
        .iter()
        .map(|slogan| format!("<li>{}</li>\n", escape(slogan)))
        .collect();
    let parameters: Vec<String> = PARAMETERS
        .iter()
        .map(|(title, content)| section(title, content))
        .collect();

    let body = format!(
        "<ul class=\"slogans\">\n{slogans}</ul>\n<h1>Parameters</h1>\n{}",
        parameters.join("\n")
    );

    layout("Home", chrome, &body)
}

pub fn about(chrome: Chrome<'_>) -> String {
    let body = format!(
        "<h1>Product And System</h1>\n{}\n{}",
        section(
            "About Us",
            "We are a team of developers building practical products for real-world problems, \
             blending creativity with technology.",
        ),
        section(
            "Our Vision",
            "To create user-centric, sustainable and scalable health technology that empowers \
             communities.",
        ),
    );

    layout("About", chrome, &body)
}

pub fn not_found(chrome: Chrome<'_>) -> String {
    layout(
        "Not Found",
        chrome,
        r#"<h1>Page not found</h1>
<p><a href="/">Back to home</a></p>"#,
    )
}

pub fn contact(chrome: Chrome<'_>, screen: &ContactScreen) -> String {
    let notice = match screen.banner() {
        Some(Banner::Sent) => banner("success", Banner::Sent.message()),
        Some(Banner::Failed) => banner("error", Banner::Failed.message()),
        None => String::new(),
    };
    let value = |field: ContactField| escape(screen.value(field));

    let body = format!(
        r#"<h1>Contact Us</h1>
{notice}
<form method="post" action="/contact" data-pending="Sending...">
<label>Name <input type="text" name="name" value="{name}" required></label>
<label>Email <input type="email" name="email" value="{email}" required></label>
<label>Phone <input type="tel" name="phone" value="{phone}"></label>
<label>Message <textarea name="message" required>{message}</textarea></label>
<button type="submit">Send Message</button>
</form>"#,
        name = value(ContactField::Name),
        email = value(ContactField::Email),
        phone = value(ContactField::Phone),
        message = value(ContactField::Message),
    );

    layout("Contact", chrome, &body)
}

pub fn login(chrome: Chrome<'_>, screen: &LoginScreen) -> String {
    let mut notices = String::new();
    if screen.registered() {
        notices.push_str(&banner("success", "Registration successful! Please log in."));
    }
    if let Some(error) = screen.error() {
        notices.push_str(&banner("error", error));
    }

    let body = format!(
        r#"<h1>Login</h1>
{notices}
<form method="post" action="/login" data-pending="Logging in...">
<label>Email <input type="email" name="email" value="{email}" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Login</button>
</form>
<p>No account yet? <a href="/register">Register</a></p>"#,
        email = escape(&screen.email),
    );

    layout("Login", chrome, &body)
}

fn field_error(screen: &RegistrationScreen, field: Field) -> String {
    format!(
        r#"<span class="field-error" id="error-{}">{}</span>"#,
        field.name(),
        escape(screen.error(field).unwrap_or_default())
    )
}

pub fn registration(chrome: Chrome<'_>, screen: &RegistrationScreen) -> String {
    let notice = screen
        .form_error()
        .map(|error| banner("error", error))
        .unwrap_or_default();

    let selected = screen.value(Field::Gender);
    let mut genders = String::from(r#"<option value="">Select gender</option>"#);
    for gender in Gender::ALL {
        let marker = if gender.as_str() == selected { " selected" } else { "" };
        genders.push_str(&format!(
            r#"<option value="{0}"{marker}>{0}</option>"#,
            gender.as_str()
        ));
    }

    let terms = if is_checked(screen.value(Field::Terms)) {
        " checked"
    } else {
        ""
    };

    let body = format!(
        r#"<h1>Create Account</h1>
{notice}
<form id="register" method="post" action="/register" data-pending="Registering..." novalidate>
<label>Full Name <input type="text" name="fullName" value="{full_name}"></label>
{full_name_error}
<label>PRN Number <input type="text" name="prnNumber" inputmode="numeric" value="{prn}"></label>
{prn_error}
<label>Gender <select name="gender">{genders}</select></label>
{gender_error}
<label>Email <input type="email" name="email" value="{email}"></label>
{email_error}
<label>Password <input type="password" name="password"></label>
{password_error}
<label><input type="checkbox" name="terms"{terms}> I accept the terms and conditions</label>
{terms_error}
<button type="submit">Register</button>
</form>
<p>Already registered? <a href="/login">Login</a></p>
{VALIDATE_SCRIPT}"#,
        full_name = escape(screen.value(Field::FullName)),
        prn = escape(screen.value(Field::Prn)),
        email = escape(screen.value(Field::Email)),
        full_name_error = field_error(screen, Field::FullName),
        prn_error = field_error(screen, Field::Prn),
        gender_error = field_error(screen, Field::Gender),
        email_error = field_error(screen, Field::Email),
        password_error = field_error(screen, Field::Password),
        terms_error = field_error(screen, Field::Terms),
    );

    layout("Register", chrome, &body)
}

pub fn dashboard(chrome: Chrome<'_>, screen: &DashboardScreen) -> String {
    let body = match screen.record() {
        Some(record) => verified(screen, record),
        None => unverified(screen),
    };

    layout("Dashboard", chrome, &body)
}

fn unverified(screen: &DashboardScreen) -> String {
    let error = screen
        .error()
        .map(|error| {
            format!(
                r#"<div class="banner error" id="prn-error">{}</div>"#,
                escape(error)
            )
        })
        .unwrap_or_default();
    let disabled = if screen.can_submit() { "" } else { " disabled" };

    format!(
        r#"<h1>Health Dashboard</h1>
<p>Enter your PRN to access your health metrics</p>
<form method="post" action="/dashboard" data-pending="Verifying...">
<label for="prn">PRN Number</label>
<input id="prn" type="text" name="prn" placeholder="Enter 12-digit PRN" maxlength="12" value="{prn}">
{error}
<button id="verify" type="submit"{disabled}>Verify PRN</button>
</form>
{PRN_SCRIPT}"#,
        prn = escape(screen.prn()),
    )
}

fn verified(screen: &DashboardScreen, record: &UserRecord) -> String {
    let vitals = VitalsView::latest(record);
    let gender = record.gender.map_or("N/A", |gender| gender.as_str());
    let signed_in = screen
        .signed_in_as()
        .map(|uid| format!(r#"<p class="signed-in">Signed in as {}</p>"#, escape(uid)))
        .unwrap_or_default();

    let (history_action, history_label) = if screen.history_open() {
        ("close", "Close History")
    } else {
        ("open", "View History")
    };
    let history = if screen.history_open() {
        history_panel(record)
    } else {
        String::new()
    };

    format!(
        r#"<header>
<h1>Welcome back, {name}</h1>
<p>{gender} • PRN: {prn}</p>
{signed_in}
<p>Last updated: {date}</p>
<a href="/dashboard/report" class="button" download>Download Report</a>
<form method="post" action="/dashboard/history">
<input type="hidden" name="action" value="{history_action}">
<button type="submit">{history_label}</button>
</form>
</header>
<section class="personal">
<h2>Personal Information</h2>
<dl>
<dt>Full Name</dt><dd>{name}</dd>
<dt>Email</dt><dd>{email}</dd>
<dt>Gender</dt><dd>{gender}</dd>
<dt>PRN</dt><dd>{prn}</dd>
</dl>
</section>
<section class="vitals">
<h2>Health Vitals</h2>
<dl>
<dt>Oxygen Level</dt><dd>{oxygen}</dd>
<dt>Heart Rate</dt><dd>{heart_rate}</dd>
<dt>Weight</dt><dd>{weight}</dd>
</dl>
</section>
{history}"#,
        name = escape(&record.full_name),
        email = escape(&record.email),
        prn = escape(&record.prn),
        date = escape(&vitals.date),
        oxygen = escape(&vitals.oxygen_saturation),
        heart_rate = escape(&vitals.heart_rate),
        weight = escape(&vitals.weight),
    )
}

fn history_panel(record: &UserRecord) -> String {
    let rows: String = record
        .health_data
        .iter()
        .map(|(date, sample)| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape(date),
                sample.oxygen_saturation,
                sample.heart_rate,
                sample.weight.map_or_else(|| "N/A".to_string(), |w| w.to_string()),
            )
        })
        .collect();

    format!(
        r#"<aside class="history">
<h2>Health History</h2>
<table>
<thead><tr><th>Date</th><th>SpO2</th><th>Heart Rate</th><th>Weight</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
</aside>"#
    )
}

#[cfg(test)]
mod tests {
    use records::{HealthSample, Reading};

    use super::*;

    fn chrome(signed_in: bool) -> Chrome<'static> {
        Chrome {
            signed_in,
            menu_open: false,
            path: "/",
        }
    }

    #[test]
    fn test_navigation_links() {
        let signed_out = landing(chrome(false));
        assert!(signed_out.contains(r#"href="/login""#));
        assert!(signed_out.contains(r#"href="/register""#));
        assert!(!signed_out.contains(r#"action="/logout""#));

        let signed_in = landing(chrome(true));
        assert!(signed_in.contains(r#"action="/logout""#));
        assert!(!signed_in.contains(r#"href="/register""#));
    }

    #[test]
    fn test_static_content() {
        let home = landing(chrome(false));
        for slogan in SLOGANS {
            assert!(home.contains(slogan));
        }
        assert!(home.contains("Heart-Rate &amp; SpO2"));
        assert!(home.contains("Weight sensor"));
        assert!(home.contains("Body temperature"));
        assert!(home.contains("© 2025 HealthCare"));

        let about = about(chrome(false));
        assert!(about.contains("About Us"));
        assert!(about.contains("Our Vision"));
    }

    #[test]
    fn test_registration_carries_live_validation() {
        let page = registration(chrome(false), &RegistrationScreen::new());

        assert!(page.contains(r##"document.querySelectorAll("#register [name]")"##));
        assert!(page.contains(r#"fetch("/register/validate""#));
        assert!(page.contains(r#"<form id="register""#));
    }

    #[test]
    fn test_contact_escapes_values() {
        let mut screen = ContactScreen::new();
        screen.set_value(ContactField::Message, "<script>alert(1)</script>");

        let page = contact(chrome(false), &screen);

        assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!page.contains("<script>alert(1)"));
    }

    #[test]
    fn test_verify_button_disabled_until_twelve() {
        let mut screen = DashboardScreen::mount(None);
        screen.set_prn("1234");
        assert!(dashboard(chrome(false), &screen).contains(r#"type="submit" disabled"#));

        screen.set_prn("123456789012");
        assert!(!dashboard(chrome(false), &screen).contains(r#"type="submit" disabled"#));
    }

    #[test]
    fn test_history_rows_in_date_order() {
        let mut record = UserRecord::default();
        for (date, spo2) in [("2025-04-26", 98.0), ("2025-04-01", 95.0)] {
            record.health_data.insert(
                date.to_string(),
                HealthSample {
                    oxygen_saturation: Reading::Known(spo2),
                    heart_rate: Reading::Unknown,
                    weight: None,
                },
            );
        }

        let panel = history_panel(&record);
        let first = panel.find("2025-04-01").unwrap();
        let second = panel.find("2025-04-26").unwrap();

        assert!(first < second);
        assert!(panel.contains("<td>Unknown</td>"));
    }
}
