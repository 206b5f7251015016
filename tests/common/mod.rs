//! Common test utilities

use vigia::models::{Applicant, Target};

/// Applicant fixture with complete data
#[allow(dead_code)]
pub fn test_applicant() -> Applicant {
    Applicant {
        passport_number: "X1234567".to_string(),
        full_name: "JANE EXAMPLE DOE".to_string(),
        birth_year: "1990".to_string(),
        nationality: "Venezuela".to_string(),
    }
}

/// Target fixture for a province
#[allow(dead_code)]
pub fn test_target(province: &str) -> Target {
    Target::new(province, test_applicant())
}

/// The portal's initial selection page: province dropdown plus session token
#[allow(dead_code)]
pub fn selection_page(action: &str) -> String {
    format!(
        r#"<html><body>
        <form action="{action}" method="post">
            <input type="hidden" name="token" value="tk-entry">
            <select name="provincia">
                <option value="">Seleccione...</option>
                <option value="04">Almería</option>
                <option value="11">Cádiz</option>
                <option value="02">Albacete</option>
            </select>
            <input type="submit" name="btnAceptar" value="Aceptar">
        </form>
        </body></html>"#
    )
}

/// An intermediate workflow page: a postback form carrying a session token
#[allow(dead_code)]
pub fn step_form_page(action: &str, token: &str) -> String {
    format!(
        r#"<html><body>
        <form action="{action}" method="post">
            <input type="hidden" name="token" value="{token}">
            <input type="submit" name="btnEnviar" value="Aceptar">
        </form>
        </body></html>"#
    )
}

/// Availability page with the portal's no-appointments marker
#[allow(dead_code)]
pub fn no_slots_page() -> String {
    r#"<html><body>
    <div id="mensajeInfo">En este momento no hay citas disponibles.</div>
    </body></html>"#
        .to_string()
}

/// Availability page listing slots in the calendar-table layout
#[allow(dead_code)]
pub fn slots_page(rows: &[(&str, &str, &str)]) -> String {
    let mut body = String::from(
        r#"<html><body><table class="calendario">
        <tr><th>Fecha</th><th>Hora</th><th>Oficina</th></tr>"#,
    );
    for (date, time, location) in rows {
        body.push_str(&format!(
            r#"<tr class="cita">
                <td class="fecha">{date}</td>
                <td class="hora">{time}</td>
                <td class="oficina">{location}</td>
            </tr>"#
        ));
    }
    body.push_str("</table></body></html>");
    body
}
