//! Labels for the integer coded `sAMAccountType` and `userAccountControl`
//! attributes. Display helpers only.

/// Known `sAMAccountType` values. `SAM_USER_OBJECT` shares its value with
/// `SAM_NORMAL_USER_ACCOUNT` and is reported under the latter name.
pub const SAM_ACCOUNT_TYPES: &[(i64, &str)] = &[
	(0x0000_0000, "SAM_DOMAIN_OBJECT"),
	(0x1000_0000, "SAM_GROUP_OBJECT"),
	(0x1000_0001, "SAM_NON_SECURITY_GROUP_OBJECT"),
	(0x2000_0000, "SAM_ALIAS_OBJECT"),
	(0x2000_0001, "SAM_NON_SECURITY_ALIAS_OBJECT"),
	(0x3000_0000, "SAM_NORMAL_USER_ACCOUNT"),
	(0x3000_0001, "SAM_MACHINE_ACCOUNT"),
	(0x3000_0002, "SAM_TRUST_ACCOUNT"),
	(0x4000_0000, "SAM_APP_BASIC_GROUP"),
	(0x4000_0001, "SAM_APP_QUERY_GROUP"),
	(0x7fff_ffff, "SAM_ACCOUNT_TYPE_MAX"),
];

/// Common `userAccountControl` flag combinations.
pub const USER_ACCOUNT_CONTROLS: &[(i64, &str)] = &[
	(512, "Normal Account"),
	(514, "Disabled Account"),
	(544, "Enabled, Password Not Required"),
	(546, "Disabled, Password Not Required"),
	(66_048, "Enabled, Password Doesn't Expire"),
	(66_050, "Disabled, Password Doesn't Expire"),
	(66_082, "Disabled, Password Doesn't Expire & Not Required"),
	(262_656, "Enabled, Smartcard Required"),
	(262_658, "Disabled, Smartcard Required"),
	(262_690, "Disabled, Smartcard Required, Password Not Required"),
	(328_194, "Disabled, Smartcard Required, Password Doesn't Expire"),
	(328_226, "Disabled, Smartcard Required, Password Doesn't Expire & Not Required"),
	(2_163_200, "Enabled, Password Doesn't Expire, Use Des Key Only"),
];

/// Label returned for values missing from [`SAM_ACCOUNT_TYPES`].
pub const SAT_UNKNOWN: &str = "sAMAccountType Unknown";

/// Label returned for values missing from [`USER_ACCOUNT_CONTROLS`].
pub const UAC_UNKNOWN: &str = "userAccountControl Unknown";

/// Label of `code` in `table`.
fn describe(table: &'static [(i64, &'static str)], code: i64) -> Option<&'static str> {
	table.iter().find(|(known, _)| *known == code).map(|(_, label)| *label)
}

/// Describe a `sAMAccountType` value.
#[must_use]
pub fn sat_description(code: i64) -> &'static str {
	describe(SAM_ACCOUNT_TYPES, code).unwrap_or(SAT_UNKNOWN)
}

/// Describe a `userAccountControl` value.
#[must_use]
pub fn uac_description(code: i64) -> &'static str {
	describe(USER_ACCOUNT_CONTROLS, code).unwrap_or(UAC_UNKNOWN)
}
