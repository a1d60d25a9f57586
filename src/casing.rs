/// Convert a snake_case, kebab-case or space-separated name to PascalCase.
///
/// `-` and `_` are treated as word separators; the first letter of each word
/// is uppercased and separators are removed. Characters after the first of a
/// word are left untouched, so already-PascalCase input passes through
/// unchanged: `level_name` → `LevelName`, `user-id` → `UserId`,
/// `UserId` → `UserId`.
pub fn to_pascal_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut word_start = true;

    for ch in name.chars() {
        match ch {
            '-' | '_' | ' ' => word_start = true,
            c if word_start => {
                out.extend(c.to_uppercase());
                word_start = false;
            }
            c => out.push(c),
        }
    }

    out
}
