//! 欢迎邮件模板
//!
//! 根据注册事件生成欢迎邮件的主题与正文。
//! 渲染是纯函数：任何字段（包括空字符串和零值 id）都按原样插值，
//! 上游数据异常产生的是内容异常的邮件而非崩溃。

use crate::event::RegistrationEvent;

/// 组合后的外发邮件内容
///
/// 仅在投递前短暂存在，收件人地址不属于内容本身，随投递调用单独传递。
#[derive(Debug, Clone, PartialEq)]
pub struct WelcomeMessage {
    pub subject: String,
    pub body: String,
}

/// 根据注册事件生成欢迎邮件
///
/// 确定性纯函数：相同事件产生逐字节相同的邮件内容。
pub fn compose(event: &RegistrationEvent) -> WelcomeMessage {
    WelcomeMessage {
        subject: "Account created!".to_string(),
        body: format!(
            "Dear {},\nYour account is now active and your ID is {} and your role is {}. Congrats!",
            event.full_name, event.id, event.role
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn make_event() -> RegistrationEvent {
        RegistrationEvent {
            id: 42,
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            address: "12 Analytical St".to_string(),
            registration_date: DateTime::UNIX_EPOCH,
            role: "admin".to_string(),
        }
    }

    #[test]
    fn test_compose_subject_and_body() {
        let message = compose(&make_event());

        assert_eq!(message.subject, "Account created!");
        assert!(message.body.contains("Dear Ada Lovelace"));
        assert!(message.body.contains("42"));
        assert!(message.body.contains("admin"));
        assert_eq!(
            message.body,
            "Dear Ada Lovelace,\nYour account is now active and your ID is 42 \
             and your role is admin. Congrats!"
        );
    }

    #[test]
    fn test_compose_is_deterministic() {
        let event = make_event();
        // 相同输入必须产生逐字节相同的输出
        assert_eq!(compose(&event), compose(&event));
    }

    #[test]
    fn test_compose_zero_value_event() {
        // 全零值事件仍然产生结构完整的邮件内容
        let event = RegistrationEvent {
            id: 0,
            full_name: String::new(),
            email: String::new(),
            address: String::new(),
            registration_date: DateTime::UNIX_EPOCH,
            role: String::new(),
        };

        let message = compose(&event);
        assert_eq!(message.subject, "Account created!");
        assert_eq!(
            message.body,
            "Dear ,\nYour account is now active and your ID is 0 \
             and your role is . Congrats!"
        );
    }

    #[test]
    fn test_compose_does_not_leak_email_into_body() {
        // 收件人地址只作为投递目标，不进入正文
        let message = compose(&make_event());
        assert!(!message.body.contains("ada@example.com"));
    }
}
